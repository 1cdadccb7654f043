//! Flat-file snapshot output.
//!
//! One ingest run writes three files into the output directory:
//! - `journals.json`: every [`JournalRecord`], compact
//! - `aggregates.json`: the [`AggregateSnapshot`], pretty-printed
//! - `meta.json`: the [`FetchMetadata`], pretty-printed
//!
//! Each file is replaced whole. Readers racing a write may see a partial file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::aggregate::AggregateSnapshot;
use crate::config::SourceKind;
use crate::fetch::ResponseValidators;
use crate::normalize::JournalRecord;

pub const JOURNALS_FILE: &str = "journals.json";
pub const AGGREGATES_FILE: &str = "aggregates.json";
pub const META_FILE: &str = "meta.json";
/// Hand-made `{"summary": .., "metrics": ..}` payload served when no ingest
/// has run yet.
pub const SAMPLE_FILE: &str = "sample.json";

/// Errors produced while writing or reading snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error on a snapshot file or directory.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serialization error (shouldn't occur for well-formed structs).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A snapshot file exists but does not hold the expected JSON.
    #[error("malformed snapshot file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Provenance of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub source_type: SourceKind,
    /// CSV export URL or search endpoint.
    pub source_url: String,
    /// Query expression that produced results (API mode).
    #[serde(default)]
    pub source_query: Option<String>,
    /// Header row of the export (CSV mode).
    #[serde(default)]
    pub source_headers: Vec<String>,
    #[serde(default)]
    pub source_header_count: usize,
    /// Total reported by the source; may exceed `fetched_total`.
    #[serde(default)]
    pub source_total: Option<u64>,
    pub fetched_total: usize,
    #[serde(default)]
    pub is_capped: bool,
    #[serde(default)]
    pub result_cap: Option<usize>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub source_last_updated_max: Option<DateTime<Utc>>,
    /// Cache validators of the CSV response.
    #[serde(default)]
    pub source_response: Option<ResponseValidators>,
}

impl FetchMetadata {
    /// Metadata for a fetch of `source_url` completed now; counts and
    /// provenance details are filled in by the caller.
    #[must_use]
    pub fn new(source_type: SourceKind, source_url: impl Into<String>) -> Self {
        Self {
            source_type,
            source_url: source_url.into(),
            source_query: None,
            source_headers: Vec::new(),
            source_header_count: 0,
            source_total: None,
            fetched_total: 0,
            is_capped: false,
            result_cap: None,
            fetched_at: Utc::now(),
            source_last_updated_max: None,
            source_response: None,
        }
    }
}

/// Paths written by [`SnapshotWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub journals: PathBuf,
    pub aggregates: PathBuf,
    pub meta: PathBuf,
}

/// Writes and reads the snapshot files of one directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn journals_path(&self) -> PathBuf {
        self.dir.join(JOURNALS_FILE)
    }

    #[must_use]
    pub fn aggregates_path(&self) -> PathBuf {
        self.dir.join(AGGREGATES_FILE)
    }

    #[must_use]
    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    #[must_use]
    pub fn sample_path(&self) -> PathBuf {
        self.dir.join(SAMPLE_FILE)
    }

    /// Writes all three files, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] on I/O or serialization failure. Files
    /// written before the failure are left in place.
    #[instrument(skip_all, fields(dir = %self.dir.display(), records = records.len()))]
    pub async fn write(
        &self,
        records: &[JournalRecord],
        aggregates: &AggregateSnapshot,
        meta: &FetchMetadata,
    ) -> Result<SnapshotPaths, SnapshotError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SnapshotError::io(&self.dir, e))?;

        let paths = SnapshotPaths {
            journals: self.journals_path(),
            aggregates: self.aggregates_path(),
            meta: self.meta_path(),
        };

        write_file(&paths.journals, serde_json::to_vec(records)?).await?;
        write_file(&paths.aggregates, serde_json::to_vec_pretty(aggregates)?).await?;
        write_file(&paths.meta, serde_json::to_vec_pretty(meta)?).await?;

        info!(dir = %self.dir.display(), "snapshot written");
        Ok(paths)
    }

    /// Reads `aggregates.json`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// I/O errors other than not-found, and malformed JSON.
    pub async fn read_aggregates(&self) -> Result<Option<AggregateSnapshot>, SnapshotError> {
        read_json(&self.aggregates_path()).await
    }

    /// Reads `meta.json`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// I/O errors other than not-found, and malformed JSON.
    pub async fn read_meta(&self) -> Result<Option<FetchMetadata>, SnapshotError> {
        read_json(&self.meta_path()).await
    }

    /// Reads `journals.json`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// I/O errors other than not-found, and malformed JSON.
    pub async fn read_journals(&self) -> Result<Option<Vec<JournalRecord>>, SnapshotError> {
        read_json(&self.journals_path()).await
    }

    /// Reads `sample.json` into the caller's payload type; `Ok(None)` when it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// I/O errors other than not-found, and malformed JSON.
    pub async fn read_sample<T: DeserializeOwned>(&self) -> Result<Option<T>, SnapshotError> {
        read_json(&self.sample_path()).await
    }
}

async fn write_file(path: &Path, bytes: Vec<u8>) -> Result<(), SnapshotError> {
    let len = bytes.len();
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| SnapshotError::io(path, e))?;
    debug!(path = %path.display(), bytes = len, "file written");
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapshotError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| SnapshotError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_records() -> Vec<JournalRecord> {
        let mut first = JournalRecord::new("1234-5678");
        first.title = Some("Journal of Examples".to_string());
        first.country = Some("DE".to_string());
        first.apc_has = Some(false);
        first.set_licenses(vec!["CC BY".to_string()]);
        first.created_date = Some(Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap());

        let mut second = JournalRecord::new("row-2");
        second.country = Some("US".to_string());
        vec![first, second]
    }

    #[tokio::test]
    async fn test_write_creates_all_files() {
        let temp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(temp.path().join("nested").join("out"));
        let records = sample_records();
        let aggregates = aggregate(&records);
        let mut meta = FetchMetadata::new(SourceKind::Csv, "https://doaj.org/csv");
        meta.fetched_total = records.len();

        let paths = writer.write(&records, &aggregates, &meta).await.unwrap();
        assert!(paths.journals.exists());
        assert!(paths.aggregates.exists());
        assert!(paths.meta.exists());

        let journals = std::fs::read_to_string(&paths.journals).unwrap();
        assert!(!journals.contains('\n'), "journals.json should be compact");
        assert!(journals.contains("\"license_BY\":true"));

        let meta_text = std::fs::read_to_string(&paths.meta).unwrap();
        assert!(meta_text.contains("\"source_type\": \"csv\""));
    }

    #[tokio::test]
    async fn test_read_back_matches_written() {
        let temp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(temp.path());
        let records = sample_records();
        let aggregates = aggregate(&records);
        let meta = FetchMetadata::new(SourceKind::Api, "https://doaj.org/api/v4/search/journals");

        writer.write(&records, &aggregates, &meta).await.unwrap();

        assert_eq!(writer.read_journals().await.unwrap().unwrap(), records);
        assert_eq!(writer.read_aggregates().await.unwrap().unwrap(), aggregates);
        assert_eq!(writer.read_meta().await.unwrap().unwrap(), meta);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(temp.path());
        let meta = FetchMetadata::new(SourceKind::Csv, "u");

        let records = sample_records();
        writer.write(&records, &aggregate(&records), &meta).await.unwrap();
        writer.write(&[], &aggregate(&[]), &meta).await.unwrap();

        assert!(writer.read_journals().await.unwrap().unwrap().is_empty());
        assert_eq!(writer.read_aggregates().await.unwrap().unwrap().total_journals, 0);
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(temp.path());
        assert!(writer.read_meta().await.unwrap().is_none());
        assert!(writer.read_aggregates().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_malformed_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(META_FILE), "{not json").unwrap();
        let writer = SnapshotWriter::new(temp.path());
        assert!(matches!(
            writer.read_meta().await,
            Err(SnapshotError::Malformed { .. })
        ));
    }
}
