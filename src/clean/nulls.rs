use anyhow::{bail, Result};
use tracing::{debug, warn};

use super::{
    dates::{earliest_year, is_bare_year},
    MissingDatePolicy, Stage, UNKNOWN_ALBUM, UNKNOWN_GENRE, UNKNOWN_TRACK,
};
use crate::table::{DateCell, MetaTable, Text};

/// Fills missing identifiers and genres, and derives release dates
/// from the earliest chart date in the table.
pub struct NullResolver {
    policy: MissingDatePolicy,
}

impl NullResolver {
    pub fn new(policy: MissingDatePolicy) -> Self {
        Self { policy }
    }

    fn resolve_release_dates(&self, table: &mut MetaTable) -> Result<()> {
        let Some(release) = table.release_date.as_mut() else {
            return Ok(());
        };

        let year = table.date.as_deref().and_then(earliest_year);
        let Some(year) = year else {
            match self.policy {
                MissingDatePolicy::Skip => {
                    warn!("no usable `date` values; release_date left unresolved");
                    return Ok(());
                }
                MissingDatePolicy::Fail => {
                    bail!("cannot derive a fallback release date: no usable `date` values")
                }
            }
        };

        let fallback = format!("{:04}-01-01", year);
        debug!(%fallback, "release_date fallback");
        for cell in release.iter_mut() {
            match cell {
                DateCell::Missing => *cell = DateCell::Text(fallback.clone()),
                DateCell::Text(s) if is_bare_year(s) => *s = format!("{}-01-01", s),
                _ => {}
            }
        }
        Ok(())
    }
}

fn fill(column: &mut [Text], sentinel: &str) {
    for cell in column.iter_mut().filter(|c| c.is_none()) {
        *cell = Some(sentinel.to_string());
    }
}

impl Stage for NullResolver {
    fn name(&self) -> &'static str {
        "nulls"
    }

    fn apply(&self, mut table: MetaTable) -> Result<MetaTable> {
        let Some(track_id) = table.track_id.as_mut() else {
            bail!("required column `track_id` is missing");
        };
        fill(track_id, UNKNOWN_TRACK);

        if let Some(album_id) = table.album_id.as_mut() {
            fill(album_id, UNKNOWN_ALBUM);
        }

        self.resolve_release_dates(&mut table)?;

        if let Some(genres) = table.genres.as_mut() {
            fill(genres, UNKNOWN_GENRE);
        }

        Ok(table)
    }
}
