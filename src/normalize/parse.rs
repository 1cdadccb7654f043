//! Field-level parsers for booleans, numbers, dates, multi-value text and
//! license rights.
//!
//! Every parser here is total: malformed input yields `None` (unknown) for
//! that one field and never an error, so a single bad cell cannot abort a
//! record or a run.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)]
static MULTI_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[|;\n]+").expect("multi-value separator regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").expect("number regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:19|20)\d{2}\b").expect("year regex is valid") // Static pattern, safe to panic
});

/// Naive date-time layouts accepted as ISO-8601 without an offset (read as UTC).
const ISO_NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO-8601 layouts carrying an explicit offset, beyond what RFC 3339 accepts.
const ISO_OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Common date-only layouts, tried in order after ISO-8601.
///
/// Day-first precedes month-first, so `03/04/2020` reads as 3 April.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y",
];

/// Splits a multi-valued text cell.
///
/// - `|`, `;` or newline present: split on runs of those characters
/// - otherwise, a comma present: split on commas
/// - otherwise: the whole string is one value
///
/// Parts are trimmed, empties dropped, duplicates removed keeping the first.
#[must_use]
pub fn split_multi(value: &str) -> Vec<String> {
    let text = value.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = if text.contains(['|', ';', '\n']) {
        MULTI_SEPARATOR.split(text).collect()
    } else if text.contains(',') {
        text.split(',').collect()
    } else {
        vec![text]
    };

    dedupe_preserving_order(
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string),
    )
}

/// Removes duplicates while keeping first-seen order.
#[must_use]
pub fn dedupe_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Parses a yes/no style flag.
///
/// `yes|y|true|1` → `Some(true)`, `no|n|false|0` → `Some(false)` (case-insensitive),
/// anything else, including empty input, → `None`.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Extracts the first signed decimal number after removing thousands separators.
#[must_use]
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(',', "");
    NUMBER_PATTERN
        .find(&cleaned)
        .and_then(|found| found.as_str().parse::<f64>().ok())
}

/// Extracts a bare `19xx` / `20xx` year.
#[must_use]
pub fn extract_year(value: &str) -> Option<i32> {
    YEAR_PATTERN
        .find(value)
        .and_then(|found| found.as_str().parse::<i32>().ok())
}

/// Parses a catalog date into a UTC timestamp.
///
/// Order of attempts:
/// 1. ISO-8601: a trailing `Z` becomes `+00:00`, minute or second precision,
///    naive values read as UTC, and the basic `YYYYMMDD` form
/// 2. [`DATE_FORMATS`], at midnight UTC
/// 3. a bare `19xx`/`20xx` year anywhere in the text, as January 1 of that year
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }

    parse_iso(text)
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(midnight_utc)
            })
        })
        .or_else(|| {
            extract_year(text)
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
                .and_then(midnight_utc)
        })
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let text = match text.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => text.to_string(),
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = ISO_OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&text, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = ISO_NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    // Basic calendar form, `YYYYMMDD`.
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(&text, "%Y%m%d")
            .ok()
            .and_then(midnight_utc);
    }
    None
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Creative Commons rights flags derived from license type strings.
///
/// Each flag is `None` when no license type data exists at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFlags {
    /// Attribution.
    pub by: Option<bool>,
    /// Non-commercial.
    pub nc: Option<bool>,
    /// No derivatives.
    pub nd: Option<bool>,
    /// Share-alike.
    pub sa: Option<bool>,
}

impl LicenseFlags {
    /// Derives the flags from license type strings such as `"CC BY-NC"`.
    #[must_use]
    pub fn from_types<S: AsRef<str>>(license_types: &[S]) -> Self {
        if license_types.is_empty() {
            return Self::default();
        }

        let joined = license_types
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
            .replace(['/', '-'], " ");
        let tokens: HashSet<&str> = joined.split_whitespace().collect();

        Self {
            by: Some(tokens.contains("BY")),
            nc: Some(tokens.contains("NC")),
            nd: Some(tokens.contains("ND")),
            sa: Some(tokens.contains("SA")),
        }
    }
}
