//! Error types for the fetch module.

use thiserror::Error;

/// Errors raised while talking to the catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The response body was not the JSON shape a search page should have.
    #[error("invalid JSON from {url}: {message}")]
    InvalidJson {
        /// The URL whose body could not be used.
        url: String,
        /// What was wrong with it.
        message: String,
    },

    /// The configured URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// None of the match-all query expressions produced a results array.
    #[error("no usable query for {endpoint} (tried: {})", tried.join(", "))]
    NoUsableQuery {
        /// The search endpoint.
        endpoint: String,
        /// Query expressions attempted, in order.
        tried: Vec<String>,
    },

    /// The CSV export could not be parsed.
    #[error("malformed CSV from {url}: {source}")]
    Csv {
        /// The export URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: csv::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name}: {message}")]
    InvalidHeader {
        /// The header name.
        name: String,
        /// Why it was rejected.
        message: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid JSON error.
    pub fn invalid_json(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a CSV parse error.
    pub fn csv(url: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true when the source rejected the request as a client error
    /// (HTTP 400), which search APIs use to signal the result window limit.
    #[must_use]
    pub fn is_window_limit(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 400, .. })
    }
}
