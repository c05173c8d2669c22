// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::clean::{validate_stages, MissingDatePolicy, StageKind};

/// Runtime settings. Defaults, then an optional YAML file named by
/// `CHARTMETA_CONFIG`, then `CHARTMETA_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Parent directory holding one subfolder per country.
    pub data_dir: PathBuf,
    pub stages: Vec<StageKind>,
    pub missing_date_policy: MissingDatePolicy,
    pub preview_rows: usize,
    /// Emit inspection summaries as JSON instead of text.
    pub inspect_json: bool,
    pub notebook_template: PathBuf,
    pub notebook_out: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Path::new("..").join("data").join("data-top50"),
            stages: StageKind::ALL.to_vec(),
            missing_date_policy: MissingDatePolicy::Skip,
            preview_rows: 10,
            inspect_json: false,
            notebook_template: PathBuf::from("analysis/EDA_france.ipynb"),
            notebook_out: PathBuf::from("analysis"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var("CHARTMETA_CONFIG") {
            Ok(path) => Self::from_yaml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        validate_stages(&cfg.stages)?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply `CHARTMETA_*` overrides looked up through `var`.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = var("CHARTMETA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(list) = var("CHARTMETA_STAGES") {
            self.stages = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<_>>()
                .context("CHARTMETA_STAGES")?;
        }
        if let Some(policy) = var("CHARTMETA_MISSING_DATE") {
            self.missing_date_policy = policy.parse().context("CHARTMETA_MISSING_DATE")?;
        }
        if let Some(n) = var("CHARTMETA_PREVIEW_ROWS") {
            self.preview_rows = n
                .trim()
                .parse()
                .with_context(|| format!("CHARTMETA_PREVIEW_ROWS={:?}", n))?;
        }
        if let Some(fmt) = var("CHARTMETA_INSPECT_FORMAT") {
            self.inspect_json = fmt.trim().eq_ignore_ascii_case("json");
        }
        if let Some(p) = var("CHARTMETA_NOTEBOOK_TEMPLATE") {
            self.notebook_template = PathBuf::from(p);
        }
        if let Some(p) = var("CHARTMETA_NOTEBOOK_OUT") {
            self.notebook_out = PathBuf::from(p);
        }
        Ok(())
    }
}
