//! Field-level similarity signals: normalized edit distance for text fields
//! and a tolerance window for dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Default date tolerance window, in days.
pub const DEFAULT_DATE_TOLERANCE_DAYS: u32 = 7;

/// Levenshtein distance over Unicode scalar values, unit cost for insert,
/// delete and substitute.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `(maxLen - editDistance) / maxLen`, or 1.0 when both strings are empty.
///
/// Case-sensitive. Use [`label_similarity`] for names and service labels.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - edit_distance(a, b)) as f64 / max_len as f64
}

/// Lowercase, trim, and collapse internal whitespace runs to one space.
pub fn normalize_label(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case- and whitespace-insensitive similarity for names and service labels.
pub fn label_similarity(a: &str, b: &str) -> f64 {
    similarity(&normalize_label(a), &normalize_label(b))
}

/// Customer-name similarity. A middle initial costs two edits (letter and
/// space), which the fuzzy threshold is calibrated against.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    label_similarity(a, b)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d %b %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a calendar date from the formats POS and rewards exports commonly use.
/// Timestamps keep only their date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive())
}

/// Signed day difference `a - b`, when both dates are known.
pub fn date_offset_days(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a - b).num_days()),
        _ => None,
    }
}

/// True iff both dates are known and at most `tolerance_days` apart.
pub fn dates_within(a: Option<NaiveDate>, b: Option<NaiveDate>, tolerance_days: u32) -> bool {
    date_offset_days(a, b).is_some_and(|off| off.unsigned_abs() <= u64::from(tolerance_days))
}

/// Parse both values as dates and compare them against the tolerance window.
/// An unparseable or empty value on either side is not a match.
pub fn is_date_match(a: &str, b: &str, tolerance_days: u32) -> bool {
    dates_within(parse_date(a), parse_date(b), tolerance_days)
}
