//! One ingest run: fetch → normalize → aggregate → write.
//!
//! The run is sequential. A transport failure aborts it before any snapshot
//! file is touched; a window-limit stop completes it with `is_capped` set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::aggregate::aggregate;
use crate::config::{ConfigError, Settings, SourceKind};
use crate::fetch::{ApiSource, CatalogClient, FetchError, Paginator, download_csv};
use crate::normalize::{JournalRecord, normalize_api_record};
use crate::snapshot::{FetchMetadata, SnapshotError, SnapshotPaths, SnapshotWriter};

/// Errors that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: SourceKind,
    /// Records written to `journals.json`.
    pub records: usize,
    pub source_total: Option<u64>,
    pub is_capped: bool,
    pub paths: SnapshotPaths,
    pub elapsed: Duration,
}

/// Records plus the metadata describing where they came from.
struct Fetched {
    records: Vec<JournalRecord>,
    meta: FetchMetadata,
}

/// Runs one ingest with `settings`.
///
/// # Errors
///
/// [`IngestError::Fetch`] when the source cannot be read (after retries),
/// [`IngestError::Snapshot`] when the output cannot be written, and
/// [`IngestError::Config`] for invalid column overrides.
#[instrument(skip_all, fields(source = %settings.source))]
pub async fn run_ingest(settings: &Settings) -> Result<IngestReport, IngestError> {
    let started = Instant::now();
    let client = build_client(settings)?;

    info!(phase = "fetch", "starting ingest");
    let Fetched { records, mut meta } = match settings.source {
        SourceKind::Csv => fetch_csv(settings, &client).await?,
        SourceKind::Api => fetch_api(settings, client).await?,
    };

    info!(phase = "aggregate", records = records.len(), "aggregating");
    let aggregates = aggregate(&records);
    meta.fetched_total = records.len();
    meta.source_last_updated_max = aggregates.last_updated_max;
    meta.fetched_at = Utc::now();

    info!(phase = "write", dir = %settings.output_dir.display(), "writing snapshot");
    let paths = SnapshotWriter::new(&settings.output_dir)
        .write(&records, &aggregates, &meta)
        .await?;

    let report = IngestReport {
        source: settings.source,
        records: records.len(),
        source_total: meta.source_total,
        is_capped: meta.is_capped,
        paths,
        elapsed: started.elapsed(),
    };
    info!(
        records = report.records,
        source_total = ?report.source_total,
        is_capped = report.is_capped,
        elapsed_ms = report.elapsed.as_millis(),
        "ingest complete"
    );
    Ok(report)
}

fn build_client(settings: &Settings) -> Result<CatalogClient, FetchError> {
    let client = CatalogClient::new(settings.retry_policy(), Arc::new(settings.throttle()))?;
    match settings.api_key() {
        Some(key) if settings.source == SourceKind::Api => client.with_api_key(&key),
        _ => Ok(client),
    }
}

async fn fetch_csv(settings: &Settings, client: &CatalogClient) -> Result<Fetched, IngestError> {
    let columns = settings.column_map()?;
    let export = download_csv(client, &settings.csv_url, &columns).await?;

    let mut meta = FetchMetadata::new(SourceKind::Csv, &settings.csv_url);
    meta.source_header_count = export.headers.len();
    meta.source_headers = export.headers;
    meta.source_total = Some(export.records.len() as u64);
    meta.source_response = Some(export.validators);

    Ok(Fetched {
        records: export.records,
        meta,
    })
}

async fn fetch_api(settings: &Settings, client: CatalogClient) -> Result<Fetched, IngestError> {
    let endpoint = settings.api_endpoint();
    let source_url = endpoint.search_url();
    let paginator = Paginator::new(&settings.query, settings.result_cap);
    let fetch = paginator.run(&ApiSource::new(client, endpoint)).await?;

    if fetch.is_capped {
        warn!(
            fetched = fetch.records.len(),
            total = ?fetch.total,
            "API fetch truncated; snapshot marked as capped"
        );
    }

    info!(phase = "normalize", records = fetch.records.len(), "normalizing");
    let records = fetch
        .records
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_api_record(raw, index + 1))
        .collect();

    let mut meta = FetchMetadata::new(SourceKind::Api, source_url);
    meta.source_query = Some(fetch.query);
    meta.source_total = fetch.total;
    meta.is_capped = fetch.is_capped;
    meta.result_cap = paginator.result_cap();

    Ok(Fetched { records, meta })
}
