//! Error types for quickfix-core

use nuget_search::SearchError;
use thiserror::Error;

/// Errors raised inside the remediation pipeline
#[derive(Error, Debug)]
pub enum QuickFixError {
    /// Registry lookup failed
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A project path was empty or escaped the workspace
    #[error("invalid project path: {0}")]
    InvalidProject(String),

    /// Walking the workspace failed
    #[error("failed to enumerate projects: {0}")]
    ProjectEnumeration(String),

    /// The task runner could not start the install command
    #[error("failed to launch task '{task}': {reason}")]
    TaskLaunch { task: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, QuickFixError>;
