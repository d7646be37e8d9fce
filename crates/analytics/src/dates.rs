//! Lenient date parsing for upstream timestamps.
//!
//! Upstream mixes RFC 3339 timestamps, space-separated datetimes and bare
//! dates. A value that parses under none of these is excluded from every
//! time bucket rather than assigned to a default.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::FlatRow;

/// Parse a date cell. Returns `None` for missing or unparseable values.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Parse a date column of a row.
pub fn row_date(row: &FlatRow, column: &str) -> Option<NaiveDate> {
    let cell = row.get(column)?;
    match cell.as_str() {
        Some(s) => parse_date(s),
        None => parse_date(&cell.to_csv_field()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_upstream_shapes() {
        assert_eq!(
            parse_date("2025-01-08"),
            NaiveDate::from_ymd_opt(2025, 1, 8)
        );
        assert_eq!(
            parse_date("2025-01-08T10:30:00Z"),
            NaiveDate::from_ymd_opt(2025, 1, 8)
        );
        assert_eq!(
            parse_date("2025-01-08 10:30:00"),
            NaiveDate::from_ymd_opt(2025, 1, 8)
        );
        assert_eq!(
            parse_date("2025-01-08T10:30:00.123456Z"),
            NaiveDate::from_ymd_opt(2025, 1, 8)
        );
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-13-45"), None);
    }
}
