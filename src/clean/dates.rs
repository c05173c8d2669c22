use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::DateCell;

/// Stand-in for any date that cannot be parsed.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => panic!("invalid sentinel date"),
};

/// Calendar years a chart date may fall in; anything outside reads as unparseable.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1677..=2262;

// YYYY, YYYY-MM, YYYY-MM-DD (or with `/`)
static YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:([-/])(\d{1,2})(?:([-/])(\d{1,2}))?)?$").unwrap());
static COMPACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());
static MDY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());

/// Exactly four ASCII digits, e.g. `"2019"`.
pub fn is_bare_year(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// `"2019"` → `"2019-01-01"`; anything else is returned as-is.
pub fn expand_bare_year(s: &str) -> String {
    if is_bare_year(s) {
        format!("{}-01-01", s)
    } else {
        s.to_string()
    }
}

/// Lenient parse of a date-like string. A time-of-day suffix is ignored;
/// month-only and year-only values resolve to the first day of the period.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let day_part = s.split(|c: char| c == 'T' || c == ' ').next().unwrap_or(s);

    let (y, m, d) = if let Some(caps) = YMD.captures(day_part) {
        // separators must agree: 2019-05/01 is rejected
        if let (Some(a), Some(b)) = (caps.get(2), caps.get(4)) {
            if a.as_str() != b.as_str() {
                return None;
            }
        }
        let y = caps[1].parse::<i32>().ok()?;
        let m = caps.get(3).map_or(Some(1), |m| m.as_str().parse().ok())?;
        let d = caps.get(5).map_or(Some(1), |d| d.as_str().parse().ok())?;
        (y, m, d)
    } else if let Some(caps) = COMPACT.captures(day_part) {
        (
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )
    } else if let Some(caps) = MDY.captures(day_part) {
        (
            caps[3].parse().ok()?,
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
        )
    } else {
        return None;
    };

    if !YEAR_RANGE.contains(&y) {
        return None;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Parse a cell that may already hold a date.
pub fn cell_date(cell: &DateCell) -> Option<NaiveDate> {
    match cell {
        DateCell::Date(d) => Some(*d),
        DateCell::Text(s) => parse_date(s),
        DateCell::Missing => None,
    }
}

/// Year of the earliest parseable date in a column.
pub fn earliest_year(cells: &[DateCell]) -> Option<i32> {
    cells.iter().filter_map(cell_date).min().map(|d| d.year())
}

/// Canonical form of a date cell: bare years expanded, then parsed;
/// anything unparseable becomes [`SENTINEL_DATE`].
pub fn normalize(cell: &DateCell) -> NaiveDate {
    match cell {
        DateCell::Date(d) => *d,
        DateCell::Text(s) => parse_date(&expand_bare_year(s)).unwrap_or(SENTINEL_DATE),
        DateCell::Missing => SENTINEL_DATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_shapes() {
        assert_eq!(parse_date("2019-05-17"), Some(ymd(2019, 5, 17)));
        assert_eq!(parse_date(" 2019/5/7 "), Some(ymd(2019, 5, 7)));
        assert_eq!(parse_date("2019-05"), Some(ymd(2019, 5, 1)));
        assert_eq!(parse_date("2019"), Some(ymd(2019, 1, 1)));
        assert_eq!(parse_date("20190517"), Some(ymd(2019, 5, 17)));
        assert_eq!(parse_date("05/17/2019"), Some(ymd(2019, 5, 17)));
        assert_eq!(parse_date("2019-05-17 00:00:00"), Some(ymd(2019, 5, 17)));
        assert_eq!(parse_date("2019-05-17T12:30:00Z"), Some(ymd(2019, 5, 17)));
    }

    #[test]
    fn rejects_garbage_and_impossible_days() {
        assert_eq!(parse_date("bad-value"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("nan"), None);
        assert_eq!(parse_date("2019-02-30"), None);
        assert_eq!(parse_date("2019-13-01"), None);
        assert_eq!(parse_date("2019-05/01"), None);
        assert_eq!(parse_date("0000"), None);
        assert_eq!(parse_date("9999-01-01"), None);
    }

    #[test]
    fn bare_year_detection() {
        assert!(is_bare_year("2019"));
        assert!(!is_bare_year("219"));
        assert!(!is_bare_year("2019-01-01"));
        assert!(!is_bare_year("20a9"));
        assert_eq!(expand_bare_year("1987"), "1987-01-01");
        assert_eq!(expand_bare_year("1987-06"), "1987-06");
    }

    #[test]
    fn earliest_year_skips_unparseable() {
        let cells = vec![
            DateCell::Text("2021-07-01".into()),
            DateCell::Missing,
            DateCell::Text("junk".into()),
            DateCell::Date(ymd(2020, 12, 31)),
        ];
        assert_eq!(earliest_year(&cells), Some(2020));
        assert_eq!(earliest_year(&[DateCell::Missing]), None);
    }

    #[test]
    fn normalize_falls_back_to_sentinel() {
        assert_eq!(normalize(&DateCell::Text("2019".into())), ymd(2019, 1, 1));
        assert_eq!(normalize(&DateCell::Text("bad-value".into())), SENTINEL_DATE);
        assert_eq!(normalize(&DateCell::Missing), SENTINEL_DATE);
        assert_eq!(SENTINEL_DATE, ymd(1900, 1, 1));
    }
}
