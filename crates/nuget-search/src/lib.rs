//! NuGet registry search
//!
//! Looks up packages by name against the NuGet search service and returns a
//! capped, registry-ordered list of candidates.
//!
//! The [`PackageSearch`] trait is the seam the quick-fix pipeline depends on;
//! [`RegistryClient`] is the HTTP implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod package;

pub use client::{parse_search_response, PackageSearch, RegistryClient};
pub use config::{clamp_max_results, SearchConfig, DEFAULT_MAX_RESULTS, DEFAULT_REGISTRY_URL};
pub use error::SearchError;
pub use package::{PackageCandidate, SearchResponse};

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, SearchError>;
