//! In-memory cache of the latest snapshot, as served by the metrics API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::snapshot::{SnapshotError, SnapshotWriter};

/// Source label reported when no snapshot exists.
pub const EMPTY_SOURCE: &str = "empty";

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    /// When the snapshot was fetched; `null` when unknown.
    pub generated_at: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_capped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_max: Option<DateTime<Utc>>,
}

impl Summary {
    /// Summary reported before any ingest has run.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total: 0,
            generated_at: None,
            source: EMPTY_SOURCE.to_string(),
            fetched_total: None,
            is_capped: None,
            last_updated_max: None,
        }
    }
}

/// One loaded snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CachedMetrics {
    pub summary: Summary,
    /// The aggregate snapshot as JSON; `{}` when none exists.
    #[serde(default = "empty_object")]
    pub metrics: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl CachedMetrics {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            summary: Summary::empty(),
            metrics: empty_object(),
        }
    }
}

/// Holds at most one parsed snapshot until explicitly invalidated.
#[derive(Debug)]
pub struct MetricsCache {
    snapshot: SnapshotWriter,
    cached: RwLock<Option<Arc<CachedMetrics>>>,
}

impl MetricsCache {
    /// Creates an empty cache over the snapshot files of `snapshot`'s directory.
    #[must_use]
    pub fn new(snapshot: SnapshotWriter) -> Self {
        Self {
            snapshot,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached snapshot, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when a snapshot file exists but cannot be
    /// read. Failures are not cached.
    pub async fn get(&self) -> Result<Arc<CachedMetrics>, SnapshotError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let mut guard = self.cached.write().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new(self.load().await?);
        *guard = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drops the cached snapshot; the next [`get`](Self::get) rereads disk.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("metrics cache invalidated");
    }

    /// Whether a snapshot is currently held.
    pub async fn is_loaded(&self) -> bool {
        self.cached.read().await.is_some()
    }

    async fn load(&self) -> Result<CachedMetrics, SnapshotError> {
        let Some(aggregates) = self.snapshot.read_aggregates().await? else {
            if let Some(sample) = self.snapshot.read_sample::<CachedMetrics>().await? {
                info!(path = %self.snapshot.sample_path().display(), "no snapshot found, serving sample");
                return Ok(sample);
            }
            info!(dir = %self.snapshot.dir().display(), "no snapshot found, serving empty metrics");
            return Ok(CachedMetrics::empty());
        };
        let meta = self.snapshot.read_meta().await?;

        let summary = Summary {
            total: aggregates.total_journals,
            generated_at: meta.as_ref().map(|meta| meta.fetched_at),
            source: meta
                .as_ref()
                .map_or_else(|| "unknown".to_string(), |meta| meta.source_type.to_string()),
            fetched_total: meta.as_ref().map(|meta| meta.fetched_total),
            is_capped: meta.as_ref().map(|meta| meta.is_capped),
            last_updated_max: aggregates.last_updated_max,
        };
        let metrics = serde_json::to_value(&aggregates)?;

        info!(total = summary.total, source = %summary.source, "snapshot loaded");
        Ok(CachedMetrics { summary, metrics })
    }
}
