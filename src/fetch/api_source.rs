//! One page of the catalog search API.
//!
//! [`ApiEndpoint`] builds page URLs from the configured parameter names;
//! [`ApiSource`] fetches and parses one page through the shared
//! [`CatalogClient`]. The [`PageSource`] trait is the seam the paginator
//! drives, so pagination can be exercised without a network.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::FetchError;
use super::client::CatalogClient;

/// Keys that may hold a page's records, in lookup order.
const RESULT_KEYS: [&str; 3] = ["results", "data", "items"];

/// Location and parameter names of the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base: String,
    pub endpoint: String,
    pub query_param: String,
    pub page_param: String,
    pub page_size_param: String,
    pub page_size: u32,
    /// Put the query URL-encoded in the path instead of a query parameter.
    pub query_in_path: bool,
}

impl ApiEndpoint {
    /// `{base}/{endpoint}` with surplus slashes removed.
    #[must_use]
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            self.endpoint.trim_matches('/')
        )
    }

    /// Builds the URL for one page (1-based) of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the base URL does not parse.
    pub fn page_url(&self, query: &str, page: u32) -> Result<String, FetchError> {
        let search = self.search_url();
        let raw = if self.query_in_path {
            format!("{search}/{}", urlencoding::encode(query))
        } else {
            search
        };

        let mut url = Url::parse(&raw).map_err(|_| FetchError::invalid_url(&raw))?;
        {
            let mut pairs = url.query_pairs_mut();
            if !self.query_in_path {
                pairs.append_pair(&self.query_param, query);
            }
            pairs.append_pair(&self.page_param, &page.to_string());
            pairs.append_pair(&self.page_size_param, &self.page_size.to_string());
        }
        Ok(url.into())
    }
}

/// Records and reported total of one search page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiPage {
    pub records: Vec<Value>,
    /// Total hits reported by the source, when it reports one.
    pub total: Option<u64>,
}

/// Extracts records and total from a search response body.
///
/// # Errors
///
/// Returns [`FetchError::InvalidJson`] when the body is not an object or has
/// no results array under any of the known keys.
pub fn parse_page(body: &Value, url: &str) -> Result<ApiPage, FetchError> {
    let Some(object) = body.as_object() else {
        return Err(FetchError::invalid_json(url, "response is not a JSON object"));
    };

    let records = RESULT_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .ok_or_else(|| {
            FetchError::invalid_json(url, "no results array (expected results, data or items)")
        })?
        .clone();

    let total = object.get("total").and_then(Value::as_u64);
    Ok(ApiPage { records, total })
}

/// Anything that can return one page of search results.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches page `page` (1-based) for `query`.
    async fn fetch_page(&self, query: &str, page: u32) -> Result<ApiPage, FetchError>;

    /// Endpoint description used in logs and errors.
    fn endpoint(&self) -> String;
}

/// The live search API.
#[derive(Debug, Clone)]
pub struct ApiSource {
    client: CatalogClient,
    endpoint: ApiEndpoint,
}

impl ApiSource {
    #[must_use]
    pub fn new(client: CatalogClient, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl PageSource for ApiSource {
    #[instrument(skip(self))]
    async fn fetch_page(&self, query: &str, page: u32) -> Result<ApiPage, FetchError> {
        let url = self.endpoint.page_url(query, page)?;
        let body = self.client.get_json(&url).await?;
        let parsed = parse_page(&body, &url)?;
        debug!(
            records = parsed.records.len(),
            total = ?parsed.total,
            "page parsed"
        );
        Ok(parsed)
    }

    fn endpoint(&self) -> String {
        self.endpoint.search_url()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(query_in_path: bool) -> ApiEndpoint {
        ApiEndpoint {
            base: "https://doaj.org/api/v4/".to_string(),
            endpoint: "/search/journals".to_string(),
            query_param: "q".to_string(),
            page_param: "page".to_string(),
            page_size_param: "pageSize".to_string(),
            page_size: 100,
            query_in_path,
        }
    }

    // ==================== URL Tests ====================

    #[test]
    fn test_page_url_with_query_parameter() {
        let url = endpoint(false).page_url("admin.in_doaj:true", 3).unwrap();
        assert_eq!(
            url,
            "https://doaj.org/api/v4/search/journals?q=admin.in_doaj%3Atrue&page=3&pageSize=100"
        );
    }

    #[test]
    fn test_page_url_with_query_in_path() {
        let url = endpoint(true).page_url("*:*", 1).unwrap();
        assert_eq!(
            url,
            "https://doaj.org/api/v4/search/journals/%2A%3A%2A?page=1&pageSize=100"
        );
    }

    #[test]
    fn test_page_url_invalid_base() {
        let mut bad = endpoint(false);
        bad.base = "not a url".to_string();
        assert!(matches!(
            bad.page_url("*", 1),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    // ==================== Page Parsing Tests ====================

    #[test]
    fn test_parse_page_results_and_total() {
        let page = parse_page(&json!({"total": 2500, "results": [{"id": "a"}]}), "u").unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total, Some(2500));
    }

    #[test]
    fn test_parse_page_falls_back_to_data_and_items() {
        let data = parse_page(&json!({"data": [{}, {}]}), "u").unwrap();
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.total, None);

        let items = parse_page(&json!({"items": []}), "u").unwrap();
        assert!(items.records.is_empty());
    }

    #[test]
    fn test_parse_page_without_results_is_invalid() {
        let err = parse_page(&json!({"error": "bad query"}), "u").unwrap_err();
        assert!(matches!(err, FetchError::InvalidJson { .. }));
        assert!(parse_page(&json!([1, 2]), "u").is_err());
    }
}
