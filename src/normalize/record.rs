//! The canonical journal record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parse::LicenseFlags;

/// One normalized journal, independent of the source it was read from.
///
/// List fields are deduplicated in first-seen order. Boolean fields are
/// `None` when the source said nothing, never a silent `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub id: String,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub country: Option<String>,
    pub pissn: Option<String>,
    pub eissn: Option<String>,
    pub apc_has: Option<bool>,
    pub apc_max_price: Option<f64>,
    pub apc_max_currency: Option<String>,
    pub waiver_has: Option<bool>,
    #[serde(default)]
    pub license_type: Vec<String>,
    pub license_url: Option<String>,
    #[serde(rename = "license_BY")]
    pub license_by: Option<bool>,
    #[serde(rename = "license_NC")]
    pub license_nc: Option<bool>,
    #[serde(rename = "license_ND")]
    pub license_nd: Option<bool>,
    #[serde(rename = "license_SA")]
    pub license_sa: Option<bool>,
    pub author_retains: Option<bool>,
    pub preservation_has: Option<bool>,
    #[serde(default)]
    pub preservation_service: Vec<String>,
    pub pid_has: Option<bool>,
    #[serde(default)]
    pub pid_scheme: Vec<String>,
    #[serde(default)]
    pub subject_terms: Vec<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub peer_review_type: Vec<String>,
    #[serde(default)]
    pub deposit_policy_directory: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub oa_start: Option<i32>,
    pub created_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub in_doaj: Option<bool>,
}

impl JournalRecord {
    /// Creates an otherwise empty record with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the license types and derives the four rights flags from them.
    pub fn set_licenses(&mut self, license_types: Vec<String>) {
        let flags = LicenseFlags::from_types(&license_types);
        self.license_type = license_types;
        self.license_by = flags.by;
        self.license_nc = flags.nc;
        self.license_nd = flags.nd;
        self.license_sa = flags.sa;
    }
}

/// Identifier fallback: explicit id, then online ISSN, then print ISSN, then
/// the 1-based position in the source.
#[must_use]
pub fn record_id(
    explicit: Option<String>,
    eissn: Option<&String>,
    pissn: Option<&String>,
    index: usize,
) -> String {
    explicit
        .or_else(|| eissn.cloned())
        .or_else(|| pissn.cloned())
        .unwrap_or_else(|| format!("row-{index}"))
}

/// Derives a presence flag for a canonicalized list field.
///
/// An explicit flag wins. Otherwise a non-empty list means `true`, an empty
/// but present field means `false`, and an absent field stays unknown.
#[must_use]
pub fn presence_flag(explicit: Option<bool>, field_present: bool, values: &[String]) -> Option<bool> {
    explicit.or_else(|| {
        if !values.is_empty() {
            Some(true)
        } else if field_present {
            Some(false)
        } else {
            None
        }
    })
}
