// src/bin/clone_notebooks.rs
use anyhow::Result;
use chartmeta::{
    config::Config,
    init_tracing,
    notebook::{clone_for_countries, COUNTRIES},
};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cfg = Config::load()?;

    let written = clone_for_countries(&cfg.notebook_template, &cfg.notebook_out, &COUNTRIES)?;
    info!(
        notebooks = written.len(),
        "cloned {} into {}",
        cfg.notebook_template.display(),
        cfg.notebook_out.display()
    );
    Ok(())
}
