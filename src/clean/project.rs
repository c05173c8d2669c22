use anyhow::Result;

use super::{dates::cell_date, Stage, UNKNOWN_GENRE};
use crate::table::{DateCell, MetaTable};

/// Keeps only the allow-listed columns, parses `release_date` and
/// fills/lower-cases `genres`.
pub struct ColumnProjector;

impl Stage for ColumnProjector {
    fn name(&self) -> &'static str {
        "project"
    }

    fn apply(&self, mut table: MetaTable) -> Result<MetaTable> {
        // everything outside the allow-list goes
        table.extra.clear();
        table.main_genre = None;

        if let Some(release) = table.release_date.as_mut() {
            for cell in release.iter_mut() {
                *cell = match cell_date(cell) {
                    Some(d) => DateCell::Date(d),
                    None => DateCell::Missing,
                };
            }
        }

        if let Some(genres) = table.genres.as_mut() {
            for g in genres.iter_mut() {
                let filled = match g.take() {
                    Some(s) => s.to_lowercase(),
                    None => UNKNOWN_GENRE.to_string(),
                };
                *g = Some(filled);
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{csv_io::read_from, MetaColumn};
    use chrono::NaiveDate;

    #[test]
    fn keeps_allow_list_in_order() {
        let raw = "url,genres,song,date,uri,main_genre\nu,Rock,S,2020-01-01,x,rock\n";
        let t = ColumnProjector.apply(read_from(raw.as_bytes()).unwrap()).unwrap();
        assert_eq!(t.header(), vec!["date", "song", "genres"]);
        for name in t.header() {
            assert!(MetaColumn::ALLOW_LIST.iter().any(|c| c.name() == name));
        }
    }

    #[test]
    fn tolerates_missing_optional_columns() {
        let t = ColumnProjector
            .apply(read_from("song,artist\nA,B\n".as_bytes()).unwrap())
            .unwrap();
        assert_eq!(t.header(), vec!["song", "artist"]);
        assert_eq!(t.len, 1);
    }

    #[test]
    fn parses_release_dates_and_blanks_garbage() {
        let raw = "release_date\n2019-05-17\n2019\nsoon\n\n";
        let t = ColumnProjector.apply(read_from(raw.as_bytes()).unwrap()).unwrap();
        assert_eq!(
            t.release_date.unwrap(),
            vec![
                DateCell::Date(NaiveDate::from_ymd_opt(2019, 5, 17).unwrap()),
                DateCell::Date(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()),
                DateCell::Missing,
            ]
        );
    }

    #[test]
    fn fills_and_lowercases_genres() {
        let raw = "genres,song\n\"K-Pop, Dance Pop\",a\n,b\nNaN,c\n";
        let t = ColumnProjector.apply(read_from(raw.as_bytes()).unwrap()).unwrap();
        assert_eq!(
            t.genres.unwrap(),
            vec![
                Some("k-pop, dance pop".to_string()),
                Some("unknown".to_string()),
                Some("unknown".to_string()),
            ]
        );
    }
}
