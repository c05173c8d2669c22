// src/clean/mod.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::table::MetaTable;

pub mod dates;
pub mod nulls;
pub mod project;
pub mod standardize;

pub use nulls::NullResolver;
pub use project::ColumnProjector;
pub use standardize::{DateNormalizer, FieldStandardizer};

pub const UNKNOWN_GENRE: &str = "unknown";
pub const UNKNOWN_TRACK: &str = "unknown_track";
pub const UNKNOWN_ALBUM: &str = "unknown_album";

/// One transform over a whole table.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn apply(&self, table: MetaTable) -> Result<MetaTable>;
}

/// What to do when no fallback release year can be derived from `date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// Leave `release_date` as it is and log a warning.
    #[default]
    Skip,
    /// Treat the file as malformed.
    Fail,
}

impl FromStr for MissingDatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => bail!("unknown missing-date policy {:?} (expected skip|fail)", other),
        }
    }
}

/// The user-selectable steps, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// RAW → PROJECTED. Reads the raw file, writes a new `-clean` file.
    Project,
    /// PROJECTED → NULL-RESOLVED.
    Nulls,
    /// NULL-RESOLVED → STANDARDIZED (dates, then genre and flag fields).
    Standardize,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Project, StageKind::Nulls, StageKind::Standardize];
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Project => "project",
            StageKind::Nulls => "nulls",
            StageKind::Standardize => "standardize",
        })
    }
}

impl FromStr for StageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "nulls" => Ok(Self::Nulls),
            "standardize" => Ok(Self::Standardize),
            other => bail!(
                "unknown stage {:?} (expected project|nulls|standardize)",
                other
            ),
        }
    }
}

/// Stage lists must be non-empty, strictly in pipeline order, without gaps.
pub fn validate_stages(kinds: &[StageKind]) -> Result<()> {
    if kinds.is_empty() {
        bail!("no stages selected");
    }
    for pair in kinds.windows(2) {
        if pair[0] >= pair[1] {
            bail!("stage {} cannot run after {}", pair[1], pair[0]);
        }
        if (pair[0] as usize) + 1 != pair[1] as usize {
            bail!("stage {} skips a step after {}", pair[1], pair[0]);
        }
    }
    Ok(())
}

/// An ordered chain of stages threaded over one table value.
pub struct Pipeline {
    kinds: Vec<StageKind>,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(kinds: &[StageKind], policy: MissingDatePolicy) -> Result<Self> {
        validate_stages(kinds)?;
        Ok(Self::build(kinds, policy))
    }

    /// Every stage, default policy.
    pub fn full() -> Self {
        Self::build(&StageKind::ALL, MissingDatePolicy::default())
    }

    fn build(kinds: &[StageKind], policy: MissingDatePolicy) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        for kind in kinds {
            match kind {
                StageKind::Project => stages.push(Box::new(ColumnProjector)),
                StageKind::Nulls => stages.push(Box::new(NullResolver::new(policy))),
                StageKind::Standardize => {
                    stages.push(Box::new(DateNormalizer));
                    stages.push(Box::new(FieldStandardizer));
                }
            }
        }
        Self {
            kinds: kinds.to_vec(),
            stages,
        }
    }

    /// Whether the first step reads a raw file rather than a cleaned one.
    pub fn starts_from_raw(&self) -> bool {
        self.kinds.first() == Some(&StageKind::Project)
    }

    pub fn kinds(&self) -> &[StageKind] {
        &self.kinds
    }

    pub fn run(&self, mut table: MetaTable) -> Result<MetaTable> {
        for stage in &self.stages {
            table = stage.apply(table)?;
            debug!(stage = stage.name(), shape = ?table.shape(), "stage done");
        }
        Ok(table)
    }
}
