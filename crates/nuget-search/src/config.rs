//! Registry client configuration

use serde::{Deserialize, Serialize};

/// Public NuGet search endpoint (US North Central).
pub const DEFAULT_REGISTRY_URL: &str = "https://azuresearch-usnc.nuget.org";

/// Number of candidates kept from a single search. Also the upper bound
/// for any configured value.
pub const DEFAULT_MAX_RESULTS: usize = 5;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Search client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search service; `/query` is appended
    pub registry_url: String,
    /// Maximum number of candidates returned to the caller
    pub max_results: usize,
    /// User agent sent with every request
    pub user_agent: String,
    /// Whole-request timeout in seconds (0 disables it)
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            registry_url: std::env::var("NUGET_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string()),
            max_results: std::env::var("NUGET_SEARCH_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(clamp_max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS),
            user_agent: format!("nuget-quickfix/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific registry
    pub fn new(registry_url: &str) -> Self {
        SearchConfig {
            registry_url: registry_url.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            ..Self::default()
        }
    }

    /// Override the result cap, clamped to `1..=DEFAULT_MAX_RESULTS`
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = clamp_max_results(max_results);
        self
    }

    /// Override the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Full URL for a query, with the query percent-encoded
    pub fn query_url(&self, query: &str) -> String {
        format!(
            "{}/query?q={}",
            self.registry_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }
}

/// Keep a configured cap within `1..=DEFAULT_MAX_RESULTS`
pub fn clamp_max_results(max_results: usize) -> usize {
    max_results.clamp(1, DEFAULT_MAX_RESULTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_new() {
        let config = SearchConfig::new("https://nuget.example.com");
        assert_eq!(config.registry_url, "https://nuget.example.com");
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert!(config.user_agent.starts_with("nuget-quickfix/"));
    }

    #[test]
    fn test_with_max_results_clamps_to_one() {
        let config = SearchConfig::new("https://nuget.example.com").with_max_results(0);
        assert_eq!(config.max_results, 1);
    }

    #[test]
    fn test_with_max_results_never_exceeds_five() {
        let config = SearchConfig::new("https://nuget.example.com").with_max_results(50);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);

        let config = SearchConfig::new("https://nuget.example.com").with_max_results(3);
        assert_eq!(config.max_results, 3);
    }

    #[test]
    fn test_query_url_percent_encodes() {
        let config = SearchConfig::new("https://nuget.example.com/");
        assert_eq!(
            config.query_url("Json Net&x=1"),
            "https://nuget.example.com/query?q=Json%20Net%26x%3D1"
        );
    }

    #[test]
    fn test_query_url_plain_identifier() {
        let config = SearchConfig::new("https://nuget.example.com");
        assert_eq!(
            config.query_url("JsonConvert"),
            "https://nuget.example.com/query?q=JsonConvert"
        );
    }
}
