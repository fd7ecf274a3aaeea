//! Host-facing ports
//!
//! The pipeline never talks to a UI or a process table directly. Hosts (the
//! terminal CLI, an editor bridge, tests) supply these implementations.
//!
//! In-memory fakes live in [`crate::fakes`].

use crate::error::Result;
use crate::install::ShellTask;
use async_trait::async_trait;

/// User-visible notices
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn info(&self, message: &str);
    async fn error(&self, message: &str);
}

/// Single-select prompt
#[async_trait]
pub trait Picker: Send + Sync {
    /// Returns the chosen item, or `None` when the user dismissed the prompt
    async fn pick_one(&self, items: &[String], placeholder: &str) -> Option<String>;
}

/// External task-execution subsystem
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Launch `task`. Returning `Ok` means it started, not that it succeeded.
    async fn execute(&self, task: ShellTask) -> Result<()>;
}
