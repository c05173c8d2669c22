use anyhow::{anyhow, Context, Result};

use super::{dates::normalize, Stage, UNKNOWN_GENRE};
use crate::table::{DateCell, Explicit, MetaTable, Text};

/// Turns `release_date` and `date` into calendar dates, mapping anything
/// unparseable to the 1900-01-01 sentinel.
pub struct DateNormalizer;

impl Stage for DateNormalizer {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn apply(&self, mut table: MetaTable) -> Result<MetaTable> {
        for column in [table.release_date.as_mut(), table.date.as_mut()]
            .into_iter()
            .flatten()
        {
            for cell in column.iter_mut() {
                *cell = DateCell::Date(normalize(cell));
            }
        }
        Ok(table)
    }
}

/// Derives `main_genre` and coerces `is_explicit` to a strict 0/1 flag.
pub struct FieldStandardizer;

/// First comma-separated genre, trimmed.
pub fn main_genre(genres: &Text) -> String {
    match genres {
        Some(g) => g.split(',').next().unwrap_or_default().trim().to_string(),
        None => UNKNOWN_GENRE.to_string(),
    }
}

/// Parse a boolean-like cell. Accepts integers or floats equal to 0/1
/// and `true`/`false` in any case.
pub fn parse_flag(raw: &str) -> Result<bool> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    let n: f64 = s
        .parse()
        .map_err(|e| anyhow!("{:?} is not a number or boolean: {}", raw, e))?;
    if n == 0.0 {
        Ok(false)
    } else if n == 1.0 {
        Ok(true)
    } else {
        Err(anyhow!("{:?} is neither 0 nor 1", raw))
    }
}

impl Stage for FieldStandardizer {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn apply(&self, mut table: MetaTable) -> Result<MetaTable> {
        if let Some(genres) = table.genres.as_ref() {
            table.main_genre = Some(genres.iter().map(|g| Some(main_genre(g))).collect());
        }

        if let Some(flags) = table.is_explicit.as_mut() {
            for (row, cell) in flags.iter_mut().enumerate() {
                let flag = match cell {
                    Explicit::Flag(b) => *b,
                    Explicit::Raw(Some(s)) => parse_flag(s)
                        .with_context(|| format!("is_explicit at row {}", row))?,
                    Explicit::Raw(None) => {
                        return Err(anyhow!("is_explicit at row {} is missing", row))
                    }
                };
                *cell = Explicit::Flag(flag);
            }
        }

        Ok(table)
    }
}
