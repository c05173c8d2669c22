use anyhow::{bail, Result};
use chartmeta::{clean::Pipeline, config::Config, driver, init_tracing};
use tracing::{error, info};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_tracing();

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::load()?;
    info!(
        data_dir = %cfg.data_dir.display(),
        stages = ?cfg.stages,
        policy = ?cfg.missing_date_policy,
        "startup"
    );

    // ─── 3) run the selected stages over every country folder ────────
    let pipeline = Pipeline::new(&cfg.stages, cfg.missing_date_policy)?;
    let report = driver::run_all(&cfg.data_dir, &pipeline)?;

    for (path, err) in &report.failed {
        error!(path = %path.display(), "{}", err);
    }
    if !report.is_success() {
        bail!(
            "{} of {} folders failed",
            report.failed.len(),
            report.folders
        );
    }

    info!("all done");
    Ok(())
}
