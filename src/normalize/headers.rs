//! CSV header resolution.
//!
//! Catalog exports rename and re-punctuate columns between releases, so each
//! logical field is located through an ordered list of candidate header names:
//! first by exact match on the normalized name, then by substring match.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lowercases and keeps only alphanumeric characters.
///
/// `"Journal title"`, `"journal_title"` and `"JOURNAL-TITLE"` all normalize to
/// `"journaltitle"`.
#[must_use]
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A logical CSV field that the normalizer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CsvField {
    Id,
    Title,
    Publisher,
    Country,
    License,
    LicenseUrl,
    Apc,
    ApcAmount,
    ApcCurrency,
    Waiver,
    AuthorRetains,
    Preservation,
    PidScheme,
    Subjects,
    Languages,
    ReviewProcess,
    DepositPolicy,
    Keywords,
    OaStart,
    Created,
    LastUpdated,
    PrintIssn,
    OnlineIssn,
}

impl CsvField {
    /// Every field, in the order they appear in a journal record.
    pub const ALL: [Self; 23] = [
        Self::Id,
        Self::Title,
        Self::Publisher,
        Self::Country,
        Self::License,
        Self::LicenseUrl,
        Self::Apc,
        Self::ApcAmount,
        Self::ApcCurrency,
        Self::Waiver,
        Self::AuthorRetains,
        Self::Preservation,
        Self::PidScheme,
        Self::Subjects,
        Self::Languages,
        Self::ReviewProcess,
        Self::DepositPolicy,
        Self::Keywords,
        Self::OaStart,
        Self::Created,
        Self::LastUpdated,
        Self::PrintIssn,
        Self::OnlineIssn,
    ];

    /// The name used for this field in the `[columns]` config table.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Publisher => "publisher",
            Self::Country => "country",
            Self::License => "license",
            Self::LicenseUrl => "license_url",
            Self::Apc => "apc",
            Self::ApcAmount => "apc_amount",
            Self::ApcCurrency => "apc_currency",
            Self::Waiver => "waiver",
            Self::AuthorRetains => "author_retains",
            Self::Preservation => "preservation",
            Self::PidScheme => "pid_scheme",
            Self::Subjects => "subjects",
            Self::Languages => "languages",
            Self::ReviewProcess => "review_process",
            Self::DepositPolicy => "deposit_policy",
            Self::Keywords => "keywords",
            Self::OaStart => "oa_start",
            Self::Created => "created",
            Self::LastUpdated => "last_updated",
            Self::PrintIssn => "pissn",
            Self::OnlineIssn => "eissn",
        }
    }

    /// Whether a substring match may locate this field.
    ///
    /// Identifier headers are short enough (`id`) to occur inside unrelated
    /// names such as "Persistent article identifiers", so they match exactly.
    #[must_use]
    pub fn allows_substring(self) -> bool {
        !matches!(self, Self::Id)
    }

    /// Built-in header candidates, most specific first.
    #[must_use]
    pub fn default_candidates(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "journalid", "doajid", "identifier"],
            Self::Title => &["title", "journaltitle", "journal title"],
            Self::Publisher => &["publisher", "publishername"],
            Self::Country => &["country", "countryofpublisher", "journalcountry"],
            Self::License => &["license", "journallicense", "licensetype", "license terms"],
            Self::LicenseUrl => &["licenseurl", "licensetermsurl"],
            Self::Apc => &["apc", "articleprocessingcharges", "journalapc"],
            Self::ApcAmount => &["apcamount", "apcmax", "maximumapc", "maxapc"],
            Self::ApcCurrency => &["apccurrency", "currency"],
            Self::Waiver => &["waiver", "waiverpolicy", "waiveravailable"],
            Self::AuthorRetains => &[
                "authorholdscopyrightwithoutrestrictions",
                "authorretaincopyright",
                "authorcopyrightholder",
                "copyrightholder",
            ],
            Self::Preservation => &["preservationservices"],
            Self::PidScheme => &[
                "persistentarticleidentifiers",
                "pidscheme",
                "persistentidentifiers",
            ],
            Self::Subjects => &["subject", "subjects", "lccsubjectcategory", "lcccodes"],
            Self::Languages => &["language", "journallanguage"],
            Self::ReviewProcess => &["reviewprocess"],
            Self::DepositPolicy => &["depositpolicydirectory"],
            Self::Keywords => &["keywords", "keyword"],
            Self::OaStart => &["oastart", "openaccessstart"],
            Self::Created => &["addedondate", "addeddate", "createddate", "dateadded"],
            Self::LastUpdated => &["lastupdated", "updatedon", "mostrecentupdate", "dateupdated"],
            Self::PrintIssn => &["printissn", "pissn", "issnprint"],
            Self::OnlineIssn => &["onlineissn", "eissn", "issnonline"],
        }
    }
}

impl fmt::Display for CsvField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a `[columns]` key names no known field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown column field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for CsvField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key() == wanted)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Configured header names per field, tried before the built-in candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    overrides: BTreeMap<CsvField, Vec<String>>,
}

impl ColumnMap {
    /// Builds a map from config keys to header lists, rejecting unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] for the first key that is not a field name.
    pub fn from_config(columns: &BTreeMap<String, Vec<String>>) -> Result<Self, UnknownField> {
        let mut overrides = BTreeMap::new();
        for (key, headers) in columns {
            let field: CsvField = key.parse()?;
            overrides.insert(field, headers.clone());
        }
        Ok(Self { overrides })
    }

    /// Adds header names for one field, ahead of the built-in candidates.
    #[must_use]
    pub fn with(mut self, field: CsvField, headers: &[&str]) -> Self {
        self.overrides
            .entry(field)
            .or_default()
            .extend(headers.iter().map(|header| (*header).to_string()));
        self
    }

    /// Configured overrides first, then the built-in candidates.
    #[must_use]
    pub fn candidates(&self, field: CsvField) -> Vec<&str> {
        self.overrides
            .get(&field)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .chain(field.default_candidates().iter().copied())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Normalized header names mapped to their column positions.
#[derive(Debug, Clone, Default)]
pub struct HeaderLookup {
    entries: Vec<(String, usize)>,
}

impl HeaderLookup {
    /// Indexes a header row. When two headers normalize to the same name the
    /// first column wins.
    #[must_use]
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header.as_ref());
            if normalized.is_empty() || entries.iter().any(|(name, _)| *name == normalized) {
                continue;
            }
            entries.push((normalized, index));
        }
        Self { entries }
    }

    /// Finds the column for the first matching candidate.
    ///
    /// All candidates are tried for an exact match before any substring match
    /// is considered, so `"Publisher"` never loses to `"Publisher's country"`.
    #[must_use]
    pub fn find<S: AsRef<str>>(&self, candidates: &[S]) -> Option<usize> {
        let normalized = normalize_candidates(candidates);
        self.find_exact(&normalized)
            .or_else(|| self.find_substring(&normalized))
    }

    fn find_exact(&self, candidates: &[String]) -> Option<usize> {
        candidates.iter().find_map(|candidate| {
            self.entries
                .iter()
                .find(|(name, _)| name == candidate)
                .map(|(_, index)| *index)
        })
    }

    fn find_substring(&self, candidates: &[String]) -> Option<usize> {
        candidates.iter().find_map(|candidate| {
            self.entries
                .iter()
                .find(|(name, _)| name.contains(candidate.as_str()))
                .map(|(_, index)| *index)
        })
    }

    /// Resolves every field's column once for a whole file.
    #[must_use]
    pub fn resolve(&self, columns: &ColumnMap) -> ResolvedColumns {
        let positions = CsvField::ALL
            .into_iter()
            .filter_map(|field| {
                let candidates = columns.candidates(field);
                let found = if field.allows_substring() {
                    self.find(&candidates)
                } else {
                    self.find_exact(&normalize_candidates(&candidates))
                };
                found.map(|index| (field, index))
            })
            .collect();
        ResolvedColumns { positions }
    }
}

fn normalize_candidates<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| normalize_header(candidate.as_ref()))
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Column positions for the fields found in one file's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    positions: BTreeMap<CsvField, usize>,
}

impl ResolvedColumns {
    /// Column index of a field, if its header was found.
    #[must_use]
    pub fn position(&self, field: CsvField) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// Fields whose header could not be found.
    #[must_use]
    pub fn missing(&self) -> Vec<CsvField> {
        CsvField::ALL
            .into_iter()
            .filter(|field| !self.positions.contains_key(field))
            .collect()
    }
}
