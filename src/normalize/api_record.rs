//! Search API record → [`JournalRecord`].
//!
//! Catalog records keep the journal description in a `bibjson` sub-object
//! and bookkeeping (`id`, dates, `admin`) at the top level. Older exports and
//! third-party mirrors flatten everything, so each bibliographic field is
//! looked up in `bibjson` first and then at the top level.

use serde_json::Value;

use super::parse::parse_date;
use super::record::{JournalRecord, presence_flag, record_id};
use super::value::FlexValue;
use crate::canonical::{DEPOSIT_POLICY, PEER_REVIEW, PID_SCHEME, PRESERVATION};

struct ApiRecord<'a> {
    top: FlexValue<'a>,
    bib: FlexValue<'a>,
}

impl<'a> ApiRecord<'a> {
    fn new(raw: &'a Value) -> Self {
        let top = FlexValue::from(raw);
        let bib = top.get("bibjson").or(top.get("bib_json"));
        Self { top, bib }
    }

    /// A bibliographic field: `bibjson.<key>`, else `<key>`.
    fn field(&self, key: &str) -> FlexValue<'a> {
        self.bib.get(key).or(self.top.get(key))
    }
}

/// Normalizes one API record. `index` is the 1-based position across all
/// fetched pages, used for the last-resort identifier.
#[must_use]
pub fn normalize_api_record(raw: &Value, index: usize) -> JournalRecord {
    let record = ApiRecord::new(raw);

    let pissn = record.field("pissn").first_text();
    let eissn = record.field("eissn").first_text();
    let explicit_id = record
        .top
        .get("id")
        .or(record.top.get("identifier"))
        .first_text();
    let id = record_id(explicit_id, eissn.as_ref(), pissn.as_ref(), index);

    let publisher = record.field("publisher");
    let country = publisher
        .get("country")
        .or(record.field("country"))
        .first_text();

    let apc = record.field("apc");
    let apc_max = apc.get("max").first();

    let license = record.field("license");

    let preservation = record.field("preservation");
    let preservation_services = preservation.member_or_self("service");
    let preservation_service = PRESERVATION.canonicalize_all(&preservation_services.texts());
    let preservation_has = presence_flag(
        preservation.get("has_preservation").as_bool(),
        preservation_services.is_present(),
        &preservation_service,
    );

    let pid = record.field("pid_scheme");
    let pid_schemes = pid
        .member_or_self("scheme")
        .or(record.field("persistent_identifier_scheme"));
    let pid_scheme = PID_SCHEME.canonicalize_all(&pid_schemes.texts());
    let pid_has = presence_flag(
        pid.get("has_pid_scheme").as_bool(),
        pid_schemes.is_present(),
        &pid_scheme,
    );

    let review_process = record
        .field("editorial")
        .get("review_process")
        .or(record.field("review_process"));

    let mut journal = JournalRecord {
        id,
        title: record.field("title").first_text(),
        publisher: publisher.first_text(),
        country,
        pissn,
        eissn,
        apc_has: apc.member_or_self("has_apc").as_bool(),
        apc_max_price: apc_max.get("price").as_number(),
        apc_max_currency: apc_max.get("currency").first_text(),
        waiver_has: record.field("waiver").member_or_self("has_waiver").as_bool(),
        license_url: license.first().get("url").first_text(),
        author_retains: record
            .field("copyright")
            .get("author_retains")
            .or(record.field("author_retains"))
            .as_bool(),
        preservation_has,
        preservation_service,
        pid_has,
        pid_scheme,
        subject_terms: record.field("subject").or(record.field("subjects")).texts(),
        language: record.field("language").texts(),
        peer_review_type: PEER_REVIEW.canonicalize_all(&review_process.texts()),
        deposit_policy_directory: DEPOSIT_POLICY.canonicalize_all(
            &record.field("deposit_policy").member_or_self("service").texts(),
        ),
        keywords: record.field("keywords").texts(),
        oa_start: record.field("oa_start").as_year(),
        created_date: record
            .top
            .get("created_date")
            .or(record.top.get("createdAt"))
            .first_text()
            .as_deref()
            .and_then(parse_date),
        last_updated: record
            .top
            .get("last_updated")
            .first_text()
            .as_deref()
            .and_then(parse_date),
        in_doaj: record.top.get("admin").get("in_doaj").as_bool(),
        ..JournalRecord::default()
    };
    journal.set_licenses(license.texts());
    journal
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn catalog_record() -> Value {
        json!({
            "id": "abc123",
            "created_date": "2015-03-02T10:00:00Z",
            "last_updated": "2023-06-01T08:30:00Z",
            "admin": {"in_doaj": true},
            "bibjson": {
                "title": "Journal of Examples",
                "pissn": "1234-5678",
                "eissn": "8765-4321",
                "publisher": {"name": "Example Press", "country": "DE"},
                "apc": {"has_apc": true, "max": [{"price": 1500, "currency": "EUR"}]},
                "waiver": {"has_waiver": false},
                "license": [
                    {"type": "CC BY-SA", "url": "https://example.org/license", "BY": true}
                ],
                "copyright": {"author_retains": true},
                "preservation": {"has_preservation": true, "service": ["clockss", "PKP PN"]},
                "pid_scheme": {"has_pid_scheme": true, "scheme": ["DOI", "Crossref"]},
                "subject": [
                    {"scheme": "LCC", "term": "Medicine", "code": "R"},
                    {"scheme": "LCC", "term": "Surgery", "code": "RD"}
                ],
                "language": ["EN", "DE"],
                "editorial": {"review_process": ["Double blind peer review"]},
                "deposit_policy": {"has_policy": true, "service": ["Sherpa/Romeo"]},
                "keywords": ["surgery", "nursing"],
                "oa_start": 2004
            }
        })
    }

    #[test]
    fn test_catalog_shape() {
        let journal = normalize_api_record(&catalog_record(), 1);

        assert_eq!(journal.id, "abc123");
        assert_eq!(journal.title.as_deref(), Some("Journal of Examples"));
        assert_eq!(journal.publisher.as_deref(), Some("Example Press"));
        assert_eq!(journal.country.as_deref(), Some("DE"));
        assert_eq!(journal.apc_has, Some(true));
        assert_eq!(journal.apc_max_price, Some(1500.0));
        assert_eq!(journal.apc_max_currency.as_deref(), Some("EUR"));
        assert_eq!(journal.waiver_has, Some(false));
        assert_eq!(journal.license_type, vec!["CC BY-SA"]);
        assert_eq!(journal.license_url.as_deref(), Some("https://example.org/license"));
        assert_eq!(journal.license_sa, Some(true));
        assert_eq!(journal.license_nc, Some(false));
        assert_eq!(journal.author_retains, Some(true));
        assert_eq!(
            journal.preservation_service,
            vec!["CLOCKSS", "PKP Preservation Network"]
        );
        assert_eq!(journal.preservation_has, Some(true));
        assert_eq!(journal.pid_scheme, vec!["DOI", "CrossRef"]);
        assert_eq!(journal.subject_terms, vec!["Medicine", "Surgery"]);
        assert_eq!(journal.language, vec!["EN", "DE"]);
        assert_eq!(journal.peer_review_type, vec!["Double anonymous peer review"]);
        assert_eq!(journal.deposit_policy_directory, vec!["Open Policy Finder"]);
        assert_eq!(journal.keywords, vec!["surgery", "nursing"]);
        assert_eq!(journal.oa_start, Some(2004));
        assert_eq!(
            journal.last_updated,
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(journal.in_doaj, Some(true));
    }

    #[test]
    fn test_flat_shape_with_scalars() {
        let raw = json!({
            "title": "Flat Journal",
            "publisher": "Flat Press",
            "country": "BR",
            "apc": "No",
            "license": "CC BY",
            "language": "Portuguese; Spanish",
            "subjects": "Education",
            "createdAt": "2019-11-20",
            "persistent_identifier_scheme": ["Handle"]
        });
        let journal = normalize_api_record(&raw, 4);

        assert_eq!(journal.id, "row-4");
        assert_eq!(journal.publisher.as_deref(), Some("Flat Press"));
        assert_eq!(journal.country.as_deref(), Some("BR"));
        assert_eq!(journal.apc_has, Some(false));
        assert_eq!(journal.license_type, vec!["CC BY"]);
        assert_eq!(journal.license_by, Some(true));
        assert_eq!(journal.language, vec!["Portuguese", "Spanish"]);
        assert_eq!(journal.subject_terms, vec!["Education"]);
        assert_eq!(journal.pid_scheme, vec!["Handle"]);
        assert_eq!(journal.pid_has, Some(true));
        assert_eq!(
            journal.created_date,
            Some(Utc.with_ymd_and_hms(2019, 11, 20, 0, 0, 0).unwrap())
        );
        assert_eq!(journal.in_doaj, None);
    }

    #[test]
    fn test_absent_fields_stay_unknown() {
        let journal = normalize_api_record(&json!({"bibjson": {"eissn": "0000-0001"}}), 1);
        assert_eq!(journal.id, "0000-0001");
        assert_eq!(journal.apc_has, None);
        assert_eq!(journal.waiver_has, None);
        assert_eq!(journal.preservation_has, None);
        assert_eq!(journal.pid_has, None);
        assert_eq!(journal.license_by, None);
        assert!(journal.subject_terms.is_empty());
    }

    #[test]
    fn test_present_but_empty_services_mean_no() {
        let raw = json!({"bibjson": {"preservation": {"service": []}, "pid_scheme": {"scheme": []}}});
        let journal = normalize_api_record(&raw, 1);
        assert_eq!(journal.preservation_has, Some(false));
        assert_eq!(journal.pid_has, Some(false));
    }

    #[test]
    fn test_explicit_flag_beats_service_list() {
        let raw = json!({"bibjson": {"preservation": {"has_preservation": false, "service": ["LOCKSS"]}}});
        let journal = normalize_api_record(&raw, 1);
        assert_eq!(journal.preservation_service, vec!["LOCKSS"]);
        assert_eq!(journal.preservation_has, Some(false));
    }

    #[test]
    fn test_bib_json_alias() {
        let raw = json!({"bib_json": {"title": "Aliased"}});
        assert_eq!(
            normalize_api_record(&raw, 1).title.as_deref(),
            Some("Aliased")
        );
    }
}
