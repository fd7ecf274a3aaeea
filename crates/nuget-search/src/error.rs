//! Error types for nuget-search

use thiserror::Error;

/// Errors that can occur while querying the package registry
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query was empty after trimming
    #[error("search query is empty")]
    EmptyQuery,

    /// Transport-level failure (DNS, connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The registry answered with a non-2xx status
    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body was not a search response
    #[error("invalid search response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode(err.to_string())
    }
}
