//! Shared User-Agent strings for catalog HTTP traffic.
//!
//! CSV downloads and search API pages identify the tool the same way, so the
//! catalog operators see one consistent client (RFC 9308).

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/doaj-dashboard";

/// Default User-Agent for catalog requests (identifies the tool).
#[must_use]
pub(crate) fn default_catalog_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("doaj-dashboard/{version} (open-access-catalog-metrics; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version_and_project_url() {
        let ua = default_catalog_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL: {ua}");
        assert_eq!(
            Some(env!("CARGO_PKG_VERSION")),
            ua.strip_prefix("doaj-dashboard/")
                .and_then(|s| s.split(' ').next()),
            "UA must contain crate version"
        );
    }

    #[test]
    fn test_user_agent_identifies_purpose() {
        let ua = default_catalog_user_agent();
        assert!(ua.contains("open-access-catalog-metrics"), "{ua}");
    }
}
