//! Drives a [`PageSource`] across pages until the result set is exhausted.
//!
//! Stop conditions, checked after every page:
//! - the page was empty
//! - the accumulated count reached the reported total
//! - the accumulated count reached the configured result cap
//! - the source rejected a later page with HTTP 400 (its result window limit)
//!
//! A window-limit stop is not a failure: the fetch is returned as capped.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::FetchError;
use super::api_source::PageSource;

/// Match-all expressions tried after the configured query.
pub const FALLBACK_QUERIES: [&str; 3] = ["*:*", "*", "{}"];

/// Result of a paginated fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginatedFetch {
    /// Raw records in source order.
    pub records: Vec<Value>,
    /// Total reported by the source (may exceed `records.len()`).
    pub total: Option<u64>,
    /// The fetch stopped before the full result set.
    pub is_capped: bool,
    /// Query expression that produced results.
    pub query: String,
    /// Page requests issued for the successful query.
    pub pages_requested: u32,
}

/// Pagination controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    candidates: Vec<String>,
    result_cap: Option<usize>,
}

impl Paginator {
    /// Creates a paginator trying `query` first, then the match-all fallbacks.
    /// A blank `query` skips straight to the fallbacks.
    #[must_use]
    pub fn new(query: &str, result_cap: Option<usize>) -> Self {
        let mut candidates: Vec<String> = Vec::with_capacity(FALLBACK_QUERIES.len() + 1);
        let query = query.trim();
        if !query.is_empty() {
            candidates.push(query.to_string());
        }
        for fallback in FALLBACK_QUERIES {
            if !candidates.iter().any(|c| c == fallback) {
                candidates.push(fallback.to_string());
            }
        }
        Self {
            candidates,
            result_cap: result_cap.filter(|cap| *cap > 0),
        }
    }

    /// Query expressions in the order they are tried.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    #[must_use]
    pub fn result_cap(&self) -> Option<usize> {
        self.result_cap
    }

    /// Fetches every page the source will give.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NoUsableQuery`] when every candidate's first page was
    ///   rejected (HTTP 400) or had no results array
    /// - any other transport error, unchanged
    #[instrument(skip(self, source), fields(endpoint = %source.endpoint()))]
    pub async fn run(&self, source: &dyn PageSource) -> Result<PaginatedFetch, FetchError> {
        for query in &self.candidates {
            match self.run_query(source, query).await? {
                Some(fetch) => {
                    info!(
                        query = %fetch.query,
                        fetched = fetch.records.len(),
                        total = ?fetch.total,
                        pages = fetch.pages_requested,
                        is_capped = fetch.is_capped,
                        "pagination complete"
                    );
                    return Ok(fetch);
                }
                None => debug!(query = %query, "query not accepted, trying next"),
            }
        }

        Err(FetchError::NoUsableQuery {
            endpoint: source.endpoint(),
            tried: self.candidates.clone(),
        })
    }

    /// Runs one candidate. `Ok(None)` means its first page was unusable.
    async fn run_query(
        &self,
        source: &dyn PageSource,
        query: &str,
    ) -> Result<Option<PaginatedFetch>, FetchError> {
        let mut fetch = PaginatedFetch {
            query: query.to_string(),
            ..PaginatedFetch::default()
        };
        let mut page = 1u32;

        loop {
            fetch.pages_requested += 1;
            let result = match source.fetch_page(query, page).await {
                Ok(result) => result,
                Err(e) if page == 1 && (e.is_window_limit() || is_shape_error(&e)) => {
                    debug!(query, error = %e, "first page unusable");
                    return Ok(None);
                }
                Err(e) if e.is_window_limit() => {
                    warn!(
                        page,
                        fetched = fetch.records.len(),
                        "source rejected page, stopping at result window limit"
                    );
                    fetch.is_capped = true;
                    return Ok(Some(fetch));
                }
                Err(e) => return Err(e),
            };

            if result.total.is_some() {
                fetch.total = result.total;
            }
            let page_len = result.records.len();
            fetch.records.extend(result.records);
            debug!(page, page_len, fetched = fetch.records.len(), "page fetched");

            if page_len == 0 {
                return Ok(Some(fetch));
            }

            if let Some(cap) = self.result_cap
                && fetch.records.len() >= cap
            {
                fetch.records.truncate(cap);
                fetch.is_capped = fetch.total.is_none_or(|total| total > cap as u64);
                if fetch.is_capped {
                    warn!(cap, total = ?fetch.total, "result cap reached, fetch truncated");
                }
                return Ok(Some(fetch));
            }

            if let Some(total) = fetch.total
                && fetch.records.len() as u64 >= total
            {
                return Ok(Some(fetch));
            }

            page += 1;
        }
    }
}

fn is_shape_error(error: &FetchError) -> bool {
    matches!(error, FetchError::InvalidJson { .. })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::fetch::api_source::ApiPage;

    /// Serves `total` synthetic records, optionally refusing pages past a
    /// window or refusing certain queries outright.
    struct FakeSource {
        total: u64,
        page_size: u64,
        report_total: bool,
        window_pages: Option<u32>,
        rejected_queries: Vec<&'static str>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl FakeSource {
        fn new(total: u64, page_size: u64) -> Self {
            Self {
                total,
                page_size,
                report_total: true,
                window_pages: None,
                rejected_queries: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, query: &str, page: u32) -> Result<ApiPage, FetchError> {
            self.calls.lock().unwrap().push((query.to_string(), page));
            if self.rejected_queries.contains(&query) {
                return Err(FetchError::http_status("fake", 400));
            }
            if self.window_pages.is_some_and(|max| page > max) {
                return Err(FetchError::http_status("fake", 400));
            }
            let start = u64::from(page - 1) * self.page_size;
            let end = (start + self.page_size).min(self.total);
            let records = (start..end).map(|i| json!({"id": i})).collect();
            Ok(ApiPage {
                records,
                total: self.report_total.then_some(self.total),
            })
        }

        fn endpoint(&self) -> String {
            "fake".to_string()
        }
    }

    // ==================== Stop Condition Tests ====================

    #[tokio::test]
    async fn test_cap_limits_pages_and_marks_capped() {
        let source = FakeSource::new(2500, 100);
        let fetch = Paginator::new("admin.in_doaj:true", Some(1000))
            .run(&source)
            .await
            .unwrap();
        assert_eq!(fetch.pages_requested, 10);
        assert_eq!(source.calls().len(), 10);
        assert_eq!(fetch.records.len(), 1000);
        assert_eq!(fetch.total, Some(2500));
        assert!(fetch.is_capped);
    }

    #[tokio::test]
    async fn test_stops_when_total_reached() {
        let source = FakeSource::new(250, 100);
        let fetch = Paginator::new("q", None).run(&source).await.unwrap();
        assert_eq!(fetch.records.len(), 250);
        assert_eq!(fetch.pages_requested, 3);
        assert!(!fetch.is_capped);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page_without_total() {
        let mut source = FakeSource::new(150, 100);
        source.report_total = false;
        let fetch = Paginator::new("q", None).run(&source).await.unwrap();
        assert_eq!(fetch.records.len(), 150);
        assert_eq!(fetch.pages_requested, 3);
        assert_eq!(fetch.total, None);
        assert!(!fetch.is_capped);
    }

    #[tokio::test]
    async fn test_cap_equal_to_total_is_not_capped() {
        let source = FakeSource::new(300, 100);
        let fetch = Paginator::new("q", Some(300)).run(&source).await.unwrap();
        assert_eq!(fetch.records.len(), 300);
        assert!(!fetch.is_capped);
    }

    #[tokio::test]
    async fn test_cap_overshoot_is_truncated() {
        let source = FakeSource::new(1000, 100);
        let fetch = Paginator::new("q", Some(150)).run(&source).await.unwrap();
        assert_eq!(fetch.records.len(), 150);
        assert_eq!(fetch.pages_requested, 2);
        assert!(fetch.is_capped);
        assert_eq!(fetch.records.last().unwrap()["id"], 149);
    }

    #[tokio::test]
    async fn test_window_limit_stops_gracefully() {
        let mut source = FakeSource::new(2500, 100);
        source.window_pages = Some(10);
        let fetch = Paginator::new("q", None).run(&source).await.unwrap();
        assert_eq!(fetch.records.len(), 1000);
        assert_eq!(fetch.pages_requested, 11);
        assert!(fetch.is_capped);
    }

    // ==================== Query Fallback Tests ====================

    #[test]
    fn test_candidates_order_and_dedup() {
        let paginator = Paginator::new("*:*", None);
        assert_eq!(paginator.candidates(), ["*:*", "*", "{}"]);

        let paginator = Paginator::new("  ", Some(0));
        assert_eq!(paginator.candidates(), ["*:*", "*", "{}"]);
        assert_eq!(paginator.result_cap(), None);
    }

    #[tokio::test]
    async fn test_rejected_query_falls_back() {
        let mut source = FakeSource::new(50, 100);
        source.rejected_queries = vec!["bad:query", "*:*"];
        let fetch = Paginator::new("bad:query", None).run(&source).await.unwrap();
        assert_eq!(fetch.query, "*");
        assert_eq!(fetch.records.len(), 50);
        assert_eq!(fetch.pages_requested, 1);
    }

    #[tokio::test]
    async fn test_no_usable_query() {
        let mut source = FakeSource::new(50, 100);
        source.rejected_queries = vec!["q", "*:*", "*", "{}"];
        let err = Paginator::new("q", None).run(&source).await.unwrap_err();
        match err {
            FetchError::NoUsableQuery { tried, .. } => assert_eq!(tried.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        struct Failing;

        #[async_trait]
        impl PageSource for Failing {
            async fn fetch_page(&self, _: &str, _: u32) -> Result<ApiPage, FetchError> {
                Err(FetchError::http_status("fake", 503))
            }

            fn endpoint(&self) -> String {
                "failing".to_string()
            }
        }

        let err = Paginator::new("q", None).run(&Failing).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
    }
}
