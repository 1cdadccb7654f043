//! Catalog transport: HTTP with retry and throttling, search API pagination,
//! and the bulk CSV export.
//!
//! # Overview
//!
//! - [`CatalogClient`] issues every GET of a run, retrying transient failures
//!   with exponential backoff and spacing requests through a shared [`Throttle`].
//! - [`Paginator`] walks the search API page by page through a [`PageSource`]
//!   until the result set, the result cap or the source's window limit ends it.
//! - [`download_csv`] fetches the export in one request and normalizes its rows.

mod api_source;
mod client;
mod csv_source;
mod error;
mod paginator;
mod retry;
mod throttle;

pub use api_source::{ApiEndpoint, ApiPage, ApiSource, PageSource, parse_page};
pub use client::{
    ApiKey, CSV_READ_TIMEOUT, CatalogClient, JSON_READ_TIMEOUT, ResponseValidators, TextResponse,
};
pub use csv_source::{CsvExport, download_csv, parse_csv};
pub use error::FetchError;
pub use paginator::{FALLBACK_QUERIES, PaginatedFetch, Paginator};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use throttle::{DEFAULT_THROTTLE, Throttle, parse_retry_after};
