//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-only format used in front matter and listings
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Parse a front-matter date string in one of the common formats
///
/// # Examples
/// ```ignore
/// parse_date("2024-01-15")           // -> 2024-01-15T00:00:00Z
/// parse_date("2024-01-15T10:30:00Z") // -> 2024-01-15T10:30:00Z
/// ```
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in [ISO_DATE, "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Reformat an ISO date (`2006-01-02`) as `Jan 2, 2006`.
/// Anything that is not an ISO date is returned unchanged.
pub fn format_date(s: &str) -> String {
    match NaiveDate::parse_from_str(s, ISO_DATE) {
        Ok(d) => d.format("%b %-d, %Y").to_string(),
        Err(_) => s.to_string(),
    }
}

/// Format a timestamp for RSS (`Mon, 02 Jan 2006 15:04:05 +0000`)
pub fn date_rfc2822(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}
