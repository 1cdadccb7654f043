//! Bulk CSV export: download and parse into [`JournalRecord`]s.

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, instrument, warn};

use super::FetchError;
use super::client::{CatalogClient, ResponseValidators};
use crate::normalize::{ColumnMap, HeaderLookup, JournalRecord, normalize_csv_row};

/// Parsed export contents.
#[derive(Debug, Clone, Default)]
pub struct CsvExport {
    /// Header row as received.
    pub headers: Vec<String>,
    pub records: Vec<JournalRecord>,
    pub validators: ResponseValidators,
}

/// Downloads the export at `url` and normalizes every row.
///
/// # Errors
///
/// Transport errors from the client, or [`FetchError::Csv`] when the body is
/// not readable CSV.
#[instrument(skip(client, columns))]
pub async fn download_csv(
    client: &CatalogClient,
    url: &str,
    columns: &ColumnMap,
) -> Result<CsvExport, FetchError> {
    let response = client.get_csv(url).await?;
    info!(bytes = response.body.len(), "CSV export downloaded");

    let (headers, records) = parse_csv(&response.body, columns).map_err(|e| FetchError::csv(url, e))?;
    Ok(CsvExport {
        headers,
        records,
        validators: response.validators,
    })
}

/// Parses CSV text: the first row is the header, every later row one journal.
///
/// Ragged rows are accepted. Empty lines are skipped, but a row of empty
/// cells is a record. Row numbers passed to the normalizer count data rows
/// from 1.
///
/// # Errors
///
/// Returns the reader's error for malformed input (e.g. invalid quoting).
pub fn parse_csv(
    body: &str,
    columns: &ColumnMap,
) -> Result<(Vec<String>, Vec<JournalRecord>), csv::Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let resolved = HeaderLookup::new(&headers).resolve(columns);

    let missing = resolved.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|field| field.key()).collect();
        debug!(missing = ?names, "CSV columns not found");
    }

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    let mut index = 0usize;
    // The reader drops empty lines itself; rows of empty cells still count.
    while reader.read_record(&mut row)? {
        index += 1;
        records.push(normalize_csv_row(&row, &resolved, index));
    }

    if records.is_empty() {
        warn!("CSV export contained no data rows");
    }
    debug!(rows = records.len(), columns = headers.len(), "CSV parsed");
    Ok((headers, records))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::normalize::CsvField;

    const EXPORT: &str = "\
Journal title,Journal ISSN (print version),Journal EISSN (online version),Country of publisher,Keywords
Alpha Journal,1234-5678,,Germany,\"physics, optics\"
,,,,
Beta Review,,8765-4321,Brazil,biology
";

    #[test]
    fn test_parse_csv_reads_headers_and_rows() {
        let (headers, records) = parse_csv(EXPORT, &ColumnMap::default()).unwrap();
        assert_eq!(headers.len(), 5);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, "1234-5678");
        assert_eq!(records[0].title.as_deref(), Some("Alpha Journal"));
        assert_eq!(records[0].keywords, vec!["physics", "optics"]);
        assert_eq!(records[1].id, "row-2");
        assert_eq!(records[1].title, None);
        assert_eq!(records[2].id, "8765-4321");
        assert_eq!(records[2].country.as_deref(), Some("Brazil"));
    }

    #[test]
    fn test_parse_csv_empty_cell_rows_keep_fallback_ids_stable() {
        let body = "Journal title,Country of publisher
First,France
,

Fourth,Spain
";
        let (_, records) = parse_csv(body, &ColumnMap::default()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["row-1", "row-2", "row-3"]);
        assert_eq!(records[2].title.as_deref(), Some("Fourth"));
    }

    #[test]
    fn test_parse_csv_ragged_row_is_tolerated() {
        let body = "Journal title,Country of publisher\nShort Row\n";
        let (_, records) = parse_csv(body, &ColumnMap::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country, None);
        assert_eq!(records[0].id, "row-1");
    }

    #[test]
    fn test_parse_csv_configured_column_wins() {
        let body = "Name,Journal title\nConfigured,Default\n";
        let columns = ColumnMap::default().with(CsvField::Title, &["Name"]);
        let (_, records) = parse_csv(body, &columns).unwrap();
        assert_eq!(records[0].title.as_deref(), Some("Configured"));
    }

    #[test]
    fn test_parse_csv_header_only() {
        let (headers, records) = parse_csv("Journal title\n", &ColumnMap::default()).unwrap();
        assert_eq!(headers, vec!["Journal title"]);
        assert!(records.is_empty());
    }
}
