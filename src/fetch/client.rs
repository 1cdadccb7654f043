//! HTTP client for the catalog, with retry and throttling.
//!
//! Every request made by an ingest run goes through one [`CatalogClient`]:
//! - the shared [`Throttle`] is acquired before each attempt
//! - failures are classified and retried per the [`RetryPolicy`]
//! - a 429 `Retry-After` header lengthens the backoff for that attempt
//!
//! Only GET requests are issued, so every retry is safe.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{
    ACCEPT, CONTENT_LENGTH, ETAG, HeaderMap, HeaderName, HeaderValue, LAST_MODIFIED, RETRY_AFTER,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::throttle::{Throttle, parse_retry_after};
use super::FetchError;
use crate::user_agent;

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout for one search API page.
pub const JSON_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Read timeout for the bulk CSV export.
pub const CSV_READ_TIMEOUT: Duration = Duration::from_secs(120);

const JSON_ACCEPT: &str = "application/json";
const CSV_ACCEPT: &str = "text/csv,*/*";

/// A static API key sent on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Header name, e.g. `Authorization`.
    pub header: String,
    /// Value prefix, e.g. `Bearer`. Empty sends the bare key.
    pub prefix: String,
    /// The key itself.
    pub key: String,
}

impl ApiKey {
    fn header_value(&self) -> String {
        if self.prefix.is_empty() {
            self.key.clone()
        } else {
            format!("{} {}", self.prefix, self.key)
        }
    }
}

/// Cache validators reported by the CSV export response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseValidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<String>,
}

impl ResponseValidators {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Self {
            etag: header(ETAG),
            last_modified: header(LAST_MODIFIED),
            content_length: header(CONTENT_LENGTH),
        }
    }
}

/// A decoded text body plus its cache validators.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub body: String,
    pub validators: ResponseValidators,
}

/// One successful exchange: status was 2xx and the body was read completely.
struct RawResponse {
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Catalog HTTP client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    policy: RetryPolicy,
    throttle: Arc<Throttle>,
    auth: Option<(HeaderName, HeaderValue)>,
}

impl CatalogClient {
    /// Creates a client with the given retry policy and shared throttle.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the TLS backend cannot initialize.
    pub fn new(policy: RetryPolicy, throttle: Arc<Throttle>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent::default_catalog_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;

        Ok(Self {
            client,
            policy,
            throttle,
            auth: None,
        })
    }

    /// Sends `key` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidHeader`] when the header name or value is
    /// not valid HTTP.
    pub fn with_api_key(mut self, key: &ApiKey) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(key.header.as_bytes())
            .map_err(|e| FetchError::invalid_header(&key.header, e.to_string()))?;
        let mut value = HeaderValue::from_str(&key.header_value())
            .map_err(|e| FetchError::invalid_header(&key.header, e.to_string()))?;
        value.set_sensitive(true);
        self.auth = Some((name, value));
        Ok(self)
    }

    /// Fetches and parses a JSON document.
    ///
    /// # Errors
    ///
    /// Transport errors once retries are exhausted, non-retryable HTTP statuses
    /// (a 400 surfaces as [`FetchError::HttpStatus`] so pagination can detect
    /// the window limit), and [`FetchError::InvalidJson`] for unparsable bodies.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let raw = self.get_with_retry(url, JSON_ACCEPT, JSON_READ_TIMEOUT).await?;
        serde_json::from_slice(&raw.body).map_err(|e| FetchError::invalid_json(url, e.to_string()))
    }

    /// Fetches a text document, decoding UTF-8 leniently and stripping a BOM.
    ///
    /// # Errors
    ///
    /// Transport errors once retries are exhausted and non-retryable HTTP
    /// statuses.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_csv(&self, url: &str) -> Result<TextResponse, FetchError> {
        let raw = self.get_with_retry(url, CSV_ACCEPT, CSV_READ_TIMEOUT).await?;
        let decoded = String::from_utf8_lossy(&raw.body);
        let body = decoded
            .strip_prefix('\u{feff}')
            .unwrap_or(&decoded)
            .to_string();
        Ok(TextResponse {
            body,
            validators: ResponseValidators::from_headers(&raw.headers),
        })
    }

    async fn get_with_retry(
        &self,
        url: &str,
        accept: &str,
        read_timeout: Duration,
    ) -> Result<RawResponse, FetchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "sending request");

            self.throttle.acquire().await;

            let error = match self.get_once(url, accept, read_timeout).await {
                Ok(raw) => return Ok(raw),
                Err(e) => e,
            };

            let failure_type = classify_error(&error);
            let retry_after_delay = if failure_type == FailureType::RateLimited {
                extract_retry_after_delay(&error)
            } else {
                None
            };

            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay: backoff_delay,
                    attempt: next_attempt,
                } => {
                    let delay = retry_after_delay.map_or(backoff_delay, |after| after.max(backoff_delay));
                    warn!(
                        url,
                        attempt = next_attempt,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        using_retry_after = retry_after_delay.is_some(),
                        error = %error,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url, %reason, "not retrying request");
                    return Err(error);
                }
            }
        }
    }

    async fn get_once(
        &self,
        url: &str,
        accept: &str,
        read_timeout: Duration,
    ) -> Result<RawResponse, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .timeout(read_timeout);
        if let Some((name, value)) = &self.auth {
            request = request.header(name.clone(), value.clone());
        }

        let response = request.send().await.map_err(|e| map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))?
            .to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(RawResponse { headers, body })
    }
}

fn map_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else if error.is_builder() {
        FetchError::invalid_url(url)
    } else {
        FetchError::network(url, error)
    }
}

fn extract_retry_after_delay(error: &FetchError) -> Option<Duration> {
    let FetchError::HttpStatus {
        retry_after: Some(header),
        ..
    } = error
    else {
        return None;
    };
    let delay = parse_retry_after(header)?;
    debug!(retry_after = %header, delay_ms = delay.as_millis(), "server sent Retry-After");
    Some(delay)
}
