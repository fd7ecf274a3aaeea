//! HTTP client for the NuGet search service
//!
//! One `GET <registry>/query?q=<query>` per search. No retries and no
//! caching: a failed lookup is terminal for that call.

use crate::config::{clamp_max_results, SearchConfig};
use crate::error::SearchError;
use crate::package::{PackageCandidate, SearchResponse};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that can turn a symbol name into package candidates
#[async_trait]
pub trait PackageSearch: Send + Sync {
    /// Search for packages matching `query`, in relevance order
    async fn search(&self, query: &str) -> Result<Vec<PackageCandidate>>;
}

/// Search client backed by the NuGet search service
#[derive(Debug, Clone)]
pub struct RegistryClient {
    config: SearchConfig,
    http_client: reqwest::Client,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(config: SearchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http_client = builder.build()?;

        Ok(RegistryClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(SearchConfig::from_env())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a single lookup against the registry
    pub async fn query(&self, query: &str) -> Result<Vec<PackageCandidate>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let url = self.config.query_url(query);
        debug!("Querying registry: {}", url);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Registry returned {} for {}", status, url);
            return Err(SearchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let candidates = parse_search_response(&body, self.config.max_results)?;
        info!(
            "Registry search for '{}' returned {} candidate(s)",
            query,
            candidates.len()
        );
        Ok(candidates)
    }
}

#[async_trait]
impl PackageSearch for RegistryClient {
    async fn search(&self, query: &str) -> Result<Vec<PackageCandidate>> {
        self.query(query).await
    }
}

/// Decode a search body and keep at most `limit` candidates in registry order.
///
/// Entries that do not decode, or have an empty identifier, cannot be
/// installed and are skipped. `limit` never exceeds [`DEFAULT_MAX_RESULTS`].
///
/// [`DEFAULT_MAX_RESULTS`]: crate::config::DEFAULT_MAX_RESULTS
pub fn parse_search_response(body: &[u8], limit: usize) -> Result<Vec<PackageCandidate>> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    debug!(
        "Search response: {} hit(s), {} in page",
        response.total_hits,
        response.data.len()
    );

    Ok(response
        .candidates()
        .filter(|candidate| {
            let keep = !candidate.id.trim().is_empty();
            if !keep {
                warn!("Skipping search result without an id");
            }
            keep
        })
        .take(clamp_max_results(limit))
        .collect())
}
