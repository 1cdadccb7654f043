//! DOAJ Dashboard Library
//!
//! This library fetches journal metadata from an open-access catalog (CSV
//! export or paginated search API), normalizes it into a flat record schema,
//! and writes aggregate snapshots consumed by the dashboard.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - HTTP transport with retry/throttle, pagination, CSV download
//! - [`normalize`] - Raw record to [`JournalRecord`] mapping
//! - [`canonical`] - Ordered alias tables for free-text categorical fields
//! - [`aggregate`] - Frequency counts and summary statistics
//! - [`snapshot`] - Flat-file output (`journals.json`, `aggregates.json`, `meta.json`)
//! - [`ingest`] - One fetch → normalize → aggregate → write run
//! - [`server`] - Cached metrics API and static dashboard server
//! - [`config`] - Settings from defaults, TOML file and environment

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod canonical;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod normalize;
pub mod server;
pub mod snapshot;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use aggregate::{AggregateSnapshot, aggregate};
pub use config::{ConfigError, Settings, SourceKind};
pub use fetch::{
    CatalogClient, DEFAULT_MAX_RETRIES, FailureType, FetchError, PaginatedFetch, Paginator,
    RetryDecision, RetryPolicy, Throttle, classify_error,
};
pub use ingest::{IngestError, IngestReport, run_ingest};
pub use normalize::{JournalRecord, LicenseFlags};
pub use server::{MetricsCache, ServerError};
pub use snapshot::{FetchMetadata, SnapshotError, SnapshotWriter};
