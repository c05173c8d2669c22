// src/bin/inspect_meta.rs
use anyhow::Result;
use chartmeta::{config::Config, driver::inspect_all, init_tracing};
use tracing::info;

/// Print shape, missing counts and leading rows of every cleaned table.
fn main() -> Result<()> {
    init_tracing();
    let cfg = Config::load()?;

    let summaries = inspect_all(&cfg.data_dir, cfg.preview_rows)?;
    info!(tables = summaries.len(), "inspected {}", cfg.data_dir.display());

    if cfg.inspect_json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for s in &summaries {
            println!("{}", s);
        }
    }
    Ok(())
}
