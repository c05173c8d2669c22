use anyhow::Result;
use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::warn;

use super::{find_meta_file, subfolders, Input};
use crate::table::{read_table, MetaTable};

/// Read-only view of one cleaned table: shape, missing counts, leading rows.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub missing: Vec<(String, usize)>,
    pub header: Vec<String>,
    pub preview: Vec<Vec<String>>,
}

impl TableSummary {
    pub fn from_table(path: &Path, table: &MetaTable, preview_rows: usize) -> Self {
        let columns = table.columns();
        let missing = columns
            .iter()
            .map(|(name, col)| (name.to_string(), col.missing_count()))
            .collect();
        let preview = (0..table.len.min(preview_rows))
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, col)| {
                        col.cell(row)
                            .map_or_else(|| "NaN".to_string(), |c| c.into_owned())
                    })
                    .collect()
            })
            .collect();
        let (rows, cols) = table.shape();
        Self {
            path: path.to_path_buf(),
            rows,
            columns: cols,
            missing,
            header: columns.iter().map(|(n, _)| n.to_string()).collect(),
            preview,
        }
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Shape: ({}, {})", self.rows, self.columns)?;
        writeln!(f, "Missing values per column:")?;
        let width = self.header.iter().map(String::len).max().unwrap_or(0);
        for (name, count) in &self.missing {
            writeln!(f, "  {:<width$}  {}", name, count, width = width)?;
        }
        writeln!(f, "First {} rows:", self.preview.len())?;
        writeln!(f, "  {}", self.header.join(" | "))?;
        for row in &self.preview {
            writeln!(f, "  {}", row.join(" | "))?;
        }
        write!(f, "{}", "-".repeat(60))
    }
}

/// Summarise the cleaned table of every subfolder. Never writes.
pub fn inspect_all(parent: &Path, preview_rows: usize) -> Result<Vec<TableSummary>> {
    let mut out = Vec::new();
    for dir in subfolders(parent)? {
        match find_meta_file(&dir, Input::Clean)? {
            Some(path) => {
                let table = read_table(&path)?;
                out.push(TableSummary::from_table(&path, &table, preview_rows));
            }
            None => warn!(dir = %dir.display(), "no {} file", Input::Clean.pattern()),
        }
    }
    Ok(out)
}
