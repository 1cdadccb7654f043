//! Alias resolution for free-text categorical fields.
//!
//! Journals describe the same preservation service, identifier scheme, review
//! process or deposit directory in dozens of spellings. Each field has an
//! ordered [`AliasTable`]: the input is reduced to a lowercase, punctuation-free
//! form and tested against each rule in turn; the first rule that matches
//! supplies the canonical label. Unmatched values fall back to a cleaned,
//! title-cased form of the input.

mod tables;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

pub use tables::{DEPOSIT_POLICY, PEER_REVIEW, PID_SCHEME, PRESERVATION};

#[allow(clippy::expect_used)]
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9\s]").expect("punctuation regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("whitespace regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^)]+)\)").expect("parenthetical regex is valid") // Static pattern, safe to panic
});

/// When a rule applies to a normalized input.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The pattern matches somewhere in the input.
    Matches(Regex),
    /// Every pattern matches somewhere in the input.
    MatchesAll(Vec<Regex>),
}

impl Predicate {
    fn is_match(&self, normalized: &str) -> bool {
        match self {
            Self::Matches(pattern) => pattern.is_match(normalized),
            Self::MatchesAll(patterns) => patterns.iter().all(|pattern| pattern.is_match(normalized)),
        }
    }
}

/// One (predicate, label) pair.
#[derive(Debug, Clone)]
pub struct AliasRule {
    pub predicate: Predicate,
    pub label: &'static str,
}

impl AliasRule {
    /// Builds a single-pattern rule.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `pattern` does not compile.
    pub fn new(pattern: &str, label: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            predicate: Predicate::Matches(Regex::new(pattern)?),
            label,
        })
    }

    /// Builds a rule that needs every pattern to match.
    ///
    /// # Errors
    ///
    /// Returns the regex error when any pattern does not compile.
    pub fn all_of(patterns: &[&str], label: &'static str) -> Result<Self, regex::Error> {
        let compiled = patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            predicate: Predicate::MatchesAll(compiled),
            label,
        })
    }
}

/// An ordered alias table for one field.
#[derive(Debug, Clone)]
pub struct AliasTable {
    name: &'static str,
    rules: Vec<AliasRule>,
    /// Tried after `rules` and before the title-case fallback.
    fallbacks: Vec<AliasRule>,
    /// Prefer a multi-word parenthesized expansion over title-casing.
    expand_parenthetical: bool,
}

impl AliasTable {
    /// Creates a table from ordered rules.
    #[must_use]
    pub fn new(name: &'static str, rules: Vec<AliasRule>) -> Self {
        Self {
            name,
            rules,
            fallbacks: Vec::new(),
            expand_parenthetical: false,
        }
    }

    /// Adds structural fallback rules tried when no alias matched.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: Vec<AliasRule>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Prefers `"Inner Words"` from `"ABBR (Inner Words)"` before title-casing.
    #[must_use]
    pub fn expanding_parenthetical(mut self) -> Self {
        self.expand_parenthetical = true;
        self
    }

    /// Maps one raw value to its canonical label. Blank input yields `None`.
    #[must_use]
    pub fn canonicalize(&self, value: &str) -> Option<String> {
        let cleaned = collapse_whitespace(value);
        if cleaned.is_empty() {
            return None;
        }

        let normalized = normalize_for_match(&cleaned);
        let matched = self
            .rules
            .iter()
            .chain(&self.fallbacks)
            .find(|rule| rule.predicate.is_match(&normalized));
        if let Some(rule) = matched {
            return Some(rule.label.to_string());
        }

        if self.expand_parenthetical {
            if let Some(inner) = parenthetical_expansion(&cleaned) {
                return Some(inner);
            }
        }

        trace!(table = self.name, value = %cleaned, "no alias matched");
        Some(smart_title(&cleaned))
    }

    /// Canonicalizes each value, dropping blanks and duplicate labels while
    /// keeping first-seen order.
    #[must_use]
    pub fn canonicalize_all<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        values
            .iter()
            .filter_map(|value| self.canonicalize(value.as_ref()))
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }
}

/// Lowercases, replaces everything but `[a-z0-9]` and whitespace with a space,
/// and collapses runs of whitespace.
#[must_use]
pub fn normalize_for_match(value: &str) -> String {
    let lowered = value.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lowered, " ");
    collapse_whitespace(&stripped)
}

fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

fn parenthetical_expansion(cleaned: &str) -> Option<String> {
    let inner = PARENTHETICAL.captures(cleaned)?.get(1)?.as_str();
    let inner = collapse_whitespace(inner);
    (inner.chars().count() > 4 && inner.contains(' ')).then_some(inner)
}

/// Title-cases input that is entirely lower- or upper-case; mixed-case input
/// is returned unchanged.
#[must_use]
pub fn smart_title(value: &str) -> String {
    let has_lower = value.chars().any(char::is_lowercase);
    let has_upper = value.chars().any(char::is_uppercase);
    if has_lower == has_upper {
        return value.to_string();
    }

    let mut titled = String::with_capacity(value.len());
    let mut word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if word_start {
                titled.extend(ch.to_uppercase());
            } else {
                titled.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            titled.push(ch);
            word_start = !(ch.is_alphanumeric() || ch == '\'');
        }
    }
    titled
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Helpers ====================

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("  PKP-PN (Public   Knowledge) "), "pkp pn public knowledge");
        assert_eq!(normalize_for_match("Sherpa/Romeo"), "sherpa romeo");
    }

    #[test]
    fn test_smart_title_only_for_single_case_input() {
        assert_eq!(smart_title("national library of wales"), "National Library Of Wales");
        assert_eq!(smart_title("NATIONAL LIBRARY"), "National Library");
        assert_eq!(smart_title("eDepot NL"), "eDepot NL");
        assert_eq!(smart_title("author's archive"), "Author's Archive");
        assert_eq!(smart_title("1234"), "1234");
    }

    // ==================== AliasTable ====================

    #[test]
    fn test_first_matching_rule_wins() {
        let table = AliasTable::new(
            "test",
            vec![
                AliasRule::new(r"\bkoreamed synapse\b", "KoreaMed Synapse").unwrap(),
                AliasRule::new(r"\bkoreamed\b", "KoreaMed").unwrap(),
            ],
        );
        assert_eq!(table.canonicalize("KoreaMed Synapse").unwrap(), "KoreaMed Synapse");
        assert_eq!(table.canonicalize("koreamed").unwrap(), "KoreaMed");
    }

    #[test]
    fn test_blank_input_is_dropped() {
        let table = AliasTable::new("test", Vec::new());
        assert_eq!(table.canonicalize("   "), None);
        assert!(table.canonicalize_all(&["", " "]).is_empty());
    }

    #[test]
    fn test_unmatched_value_is_cleaned_and_titled() {
        let table = AliasTable::new("test", Vec::new());
        assert_eq!(table.canonicalize("  local   archive ").unwrap(), "Local Archive");
    }

    #[test]
    fn test_all_of_predicate() {
        let table = AliasTable::new("test", Vec::new()).with_fallbacks(vec![
            AliasRule::all_of(&[r"\bpublisher\b", r"\b(site|website)\b"], "Publisher's own site").unwrap(),
        ]);
        assert_eq!(
            table.canonicalize("Website of the publisher").unwrap(),
            "Publisher's own site"
        );
        assert_eq!(table.canonicalize("publisher").unwrap(), "Publisher");
    }

    #[test]
    fn test_canonicalize_all_dedupes_labels_in_order() {
        let values = ["Double blind", "Portico", "double-blind peer review"];
        let labels = PEER_REVIEW.canonicalize_all(&values);
        assert_eq!(labels, vec!["Double anonymous peer review", "Portico"]);
    }

    #[test]
    fn test_canonicalize_is_deterministic() {
        let input = ["LOCKSS", "CLOCKSS", "lockss", "Internet Archive"];
        let first = PRESERVATION.canonicalize_all(&input);
        let second = PRESERVATION.canonicalize_all(&input);
        assert_eq!(first, second);
        assert_eq!(first, vec!["LOCKSS", "CLOCKSS", "Internet Archive"]);
    }
}
