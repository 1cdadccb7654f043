//! CSV export row → [`JournalRecord`].

use csv::StringRecord;

use super::headers::{CsvField, ResolvedColumns};
use super::parse::parse_date;
use super::record::{JournalRecord, presence_flag, record_id};
use super::value::FlexValue;
use crate::canonical::{DEPOSIT_POLICY, PEER_REVIEW, PID_SCHEME, PRESERVATION};

/// One data row plus the column positions resolved from the header row.
struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a ResolvedColumns,
}

impl<'a> Row<'a> {
    fn field(&self, field: CsvField) -> FlexValue<'a> {
        FlexValue::cell(
            self.columns
                .position(field)
                .and_then(|index| self.record.get(index)),
        )
    }

    fn text(&self, field: CsvField) -> Option<String> {
        self.field(field).first_text()
    }

    fn texts(&self, field: CsvField) -> Vec<String> {
        self.field(field).texts()
    }
}

/// Normalizes one CSV row. `index` is the 1-based data row position used for
/// the last-resort identifier.
#[must_use]
pub fn normalize_csv_row(record: &StringRecord, columns: &ResolvedColumns, index: usize) -> JournalRecord {
    let row = Row { record, columns };

    let pissn = row.text(CsvField::PrintIssn);
    let eissn = row.text(CsvField::OnlineIssn);
    let id = record_id(row.text(CsvField::Id), eissn.as_ref(), pissn.as_ref(), index);

    let preservation_field = row.field(CsvField::Preservation);
    let preservation_service = PRESERVATION.canonicalize_all(&preservation_field.texts());
    let pid_field = row.field(CsvField::PidScheme);
    let pid_scheme = PID_SCHEME.canonicalize_all(&pid_field.texts());

    let mut journal = JournalRecord {
        id,
        title: row.text(CsvField::Title),
        publisher: row.text(CsvField::Publisher),
        country: row.text(CsvField::Country),
        pissn,
        eissn,
        apc_has: row.field(CsvField::Apc).as_bool(),
        apc_max_price: row.field(CsvField::ApcAmount).as_number(),
        apc_max_currency: row.text(CsvField::ApcCurrency),
        waiver_has: row.field(CsvField::Waiver).as_bool(),
        license_url: row.text(CsvField::LicenseUrl),
        author_retains: row.field(CsvField::AuthorRetains).as_bool(),
        preservation_has: presence_flag(None, preservation_field.is_present(), &preservation_service),
        preservation_service,
        pid_has: presence_flag(None, pid_field.is_present(), &pid_scheme),
        pid_scheme,
        subject_terms: row.texts(CsvField::Subjects),
        language: row.texts(CsvField::Languages),
        peer_review_type: PEER_REVIEW.canonicalize_all(&row.texts(CsvField::ReviewProcess)),
        deposit_policy_directory: DEPOSIT_POLICY
            .canonicalize_all(&row.texts(CsvField::DepositPolicy)),
        keywords: row.texts(CsvField::Keywords),
        oa_start: row.field(CsvField::OaStart).as_year(),
        created_date: row.text(CsvField::Created).as_deref().and_then(parse_date),
        last_updated: row.text(CsvField::LastUpdated).as_deref().and_then(parse_date),
        in_doaj: Some(true),
        ..JournalRecord::default()
    };
    journal.set_licenses(row.texts(CsvField::License));
    journal
}
