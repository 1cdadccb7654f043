//! Frequency counts and summary statistics over a set of journal records.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::JournalRecord;

/// Number of subject terms kept in [`AggregateSnapshot::subjects_top`].
pub const SUBJECTS_TOP_N: usize = 100;

/// Number of publishers kept in [`AggregateSnapshot::publishers_top`].
pub const PUBLISHERS_TOP_N: usize = 30;

/// The dashboard's summary of one record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub total_journals: usize,
    pub by_country: BTreeMap<String, usize>,
    pub by_license_type: BTreeMap<String, usize>,
    pub apc: BTreeMap<String, usize>,
    pub waiver: BTreeMap<String, usize>,
    pub preservation: BTreeMap<String, usize>,
    pub pid: BTreeMap<String, usize>,
    pub author_retains: BTreeMap<String, usize>,
    /// `[term, count]` pairs, most frequent first.
    pub subjects_top: Vec<(String, usize)>,
    pub created_year: BTreeMap<i32, usize>,
    pub last_updated_max: Option<DateTime<Utc>>,
    #[serde(default)]
    pub by_language: BTreeMap<String, usize>,
    /// `[publisher, count]` pairs, most frequent first.
    #[serde(default)]
    pub publishers_top: Vec<(String, usize)>,
}

/// Counter that remembers first appearance, so ties rank in source order.
#[derive(Debug, Default)]
struct Tally {
    counts: HashMap<String, (usize, usize)>,
}

impl Tally {
    fn add(&mut self, key: &str) {
        let next_rank = self.counts.len();
        self.counts
            .entry(key.to_string())
            .or_insert((0, next_rank))
            .0 += 1;
    }

    fn into_map(self) -> BTreeMap<String, usize> {
        self.counts
            .into_iter()
            .map(|(key, (count, _))| (key, count))
            .collect()
    }

    fn most_common(self, limit: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, (usize, usize))> = self.counts.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|(key, (count, _))| (key, count))
            .collect()
    }
}

fn yes_no(flags: impl Iterator<Item = Option<bool>>) -> BTreeMap<String, usize> {
    let mut tally = Tally::default();
    for flag in flags.flatten() {
        tally.add(if flag { "yes" } else { "no" });
    }
    tally.into_map()
}

/// Computes the aggregate snapshot. Counts are exact; absent values are
/// excluded from every table rather than counted as "no".
#[must_use]
pub fn aggregate(records: &[JournalRecord]) -> AggregateSnapshot {
    let mut country = Tally::default();
    let mut license_type = Tally::default();
    let mut subjects = Tally::default();
    let mut languages = Tally::default();
    let mut publishers = Tally::default();
    let mut created_year = BTreeMap::new();

    for record in records {
        if let Some(value) = record.country.as_deref().filter(|value| !value.is_empty()) {
            country.add(value);
        }
        if let Some(value) = record.publisher.as_deref().filter(|value| !value.is_empty()) {
            publishers.add(value);
        }
        for value in record.license_type.iter().filter(|value| !value.is_empty()) {
            license_type.add(value);
        }
        for term in &record.subject_terms {
            subjects.add(term);
        }
        for language in &record.language {
            languages.add(language);
        }
        if let Some(created) = record.created_date {
            *created_year.entry(created.year()).or_insert(0) += 1;
        }
    }

    AggregateSnapshot {
        total_journals: records.len(),
        by_country: country.into_map(),
        by_license_type: license_type.into_map(),
        apc: yes_no(records.iter().map(|record| record.apc_has)),
        waiver: yes_no(records.iter().map(|record| record.waiver_has)),
        preservation: yes_no(records.iter().map(|record| record.preservation_has)),
        pid: yes_no(records.iter().map(|record| record.pid_has)),
        author_retains: yes_no(records.iter().map(|record| record.author_retains)),
        subjects_top: subjects.most_common(SUBJECTS_TOP_N),
        created_year,
        last_updated_max: records.iter().filter_map(|record| record.last_updated).max(),
        by_language: languages.into_map(),
        publishers_top: publishers.most_common(PUBLISHERS_TOP_N),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn with_country(country: Option<&str>) -> JournalRecord {
        let mut record = JournalRecord::new("x");
        record.country = country.map(str::to_string);
        record
    }

    #[test]
    fn test_country_counts_exclude_absent() {
        let records = vec![
            with_country(Some("US")),
            with_country(Some("US")),
            with_country(Some("DE")),
            with_country(None),
        ];
        let snapshot = aggregate(&records);
        assert_eq!(snapshot.total_journals, 4);
        assert_eq!(snapshot.by_country.len(), 2);
        assert_eq!(snapshot.by_country["US"], 2);
        assert_eq!(snapshot.by_country["DE"], 1);
    }

    #[test]
    fn test_yes_no_only_over_known_values() {
        let mut a = JournalRecord::new("a");
        a.apc_has = Some(true);
        let mut b = JournalRecord::new("b");
        b.apc_has = Some(false);
        let c = JournalRecord::new("c");

        let snapshot = aggregate(&[a, b, c]);
        assert_eq!(snapshot.apc["yes"], 1);
        assert_eq!(snapshot.apc["no"], 1);
        assert!(snapshot.waiver.is_empty());
    }

    #[test]
    fn test_license_types_count_each_entry() {
        let mut a = JournalRecord::new("a");
        a.set_licenses(vec!["CC BY".into(), "CC BY-SA".into()]);
        let mut b = JournalRecord::new("b");
        b.set_licenses(vec!["CC BY".into()]);

        let snapshot = aggregate(&[a, b]);
        assert_eq!(snapshot.by_license_type["CC BY"], 2);
        assert_eq!(snapshot.by_license_type["CC BY-SA"], 1);
    }

    #[test]
    fn test_top_lists_rank_by_count_then_first_appearance() {
        let subjects = [
            vec!["History"],
            vec!["Medicine", "History"],
            vec!["Art", "Medicine"],
            vec!["Zoology"],
        ];
        let records: Vec<_> = subjects
            .iter()
            .map(|terms| {
                let mut record = JournalRecord::new("x");
                record.subject_terms = terms.iter().map(|term| (*term).to_string()).collect();
                record
            })
            .collect();

        let snapshot = aggregate(&records);
        assert_eq!(
            snapshot.subjects_top,
            vec![
                ("History".to_string(), 2),
                ("Medicine".to_string(), 2),
                ("Art".to_string(), 1),
                ("Zoology".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_publishers_top_is_limited() {
        let records: Vec<_> = (0..40)
            .map(|n| {
                let mut record = JournalRecord::new(format!("{n}"));
                record.publisher = Some(format!("Press {n}"));
                record
            })
            .collect();
        let snapshot = aggregate(&records);
        assert_eq!(snapshot.publishers_top.len(), PUBLISHERS_TOP_N);
        assert_eq!(snapshot.publishers_top[0].0, "Press 0");
    }

    #[test]
    fn test_created_year_histogram_and_last_updated_max() {
        let mut a = JournalRecord::new("a");
        a.created_date = Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
        a.last_updated = Some(Utc.with_ymd_and_hms(2022, 5, 1, 0, 0, 0).unwrap());
        let mut b = JournalRecord::new("b");
        b.created_date = Some(Utc.with_ymd_and_hms(2015, 7, 9, 0, 0, 0).unwrap());
        b.last_updated = Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
        let c = JournalRecord::new("c");

        let snapshot = aggregate(&[a, b, c]);
        assert_eq!(snapshot.created_year.get(&2015), Some(&2));
        assert_eq!(snapshot.created_year.len(), 1);
        assert_eq!(
            snapshot.last_updated_max,
            Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap())
        );
    }

    #[test]
    fn test_by_language_counts_each_language() {
        let mut a = JournalRecord::new("a");
        a.language = vec!["English".into(), "French".into()];
        let mut b = JournalRecord::new("b");
        b.language = vec!["English".into()];
        let snapshot = aggregate(&[a, b]);
        assert_eq!(snapshot.by_language["English"], 2);
        assert_eq!(snapshot.by_language["French"], 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut a = JournalRecord::new("a");
        a.subject_terms = vec!["Medicine".into()];
        a.created_date = Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
        let value = serde_json::to_value(aggregate(&[a])).unwrap();
        assert_eq!(value["subjects_top"][0][0], "Medicine");
        assert_eq!(value["subjects_top"][0][1], 1);
        assert_eq!(value["created_year"]["2015"], 1);
        assert!(value["last_updated_max"].is_null());
    }

    #[test]
    fn test_empty_input() {
        let snapshot = aggregate(&[]);
        assert_eq!(snapshot.total_journals, 0);
        assert!(snapshot.subjects_top.is_empty());
        assert_eq!(snapshot.last_updated_max, None);
    }
}
