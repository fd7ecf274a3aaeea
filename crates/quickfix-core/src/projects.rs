//! Project manifest discovery

use crate::error::{QuickFixError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Workspace-relative path of a project manifest, `/`-separated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectTarget(String);

impl ProjectTarget {
    /// Validate a relative manifest path.
    ///
    /// Rejects empty paths, absolute paths and paths that climb out of the
    /// workspace with `..`.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(QuickFixError::InvalidProject("empty path".to_string()));
        }
        let escapes = Path::new(&path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(QuickFixError::InvalidProject(path));
        }
        Ok(ProjectTarget(path))
    }

    /// Build from a path found under `root`
    pub fn from_workspace_path(root: &Path, path: &Path) -> Result<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| QuickFixError::InvalidProject(path.display().to_string()))?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute location under `root`
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for ProjectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectTarget {
    type Error = QuickFixError;

    fn try_from(path: String) -> Result<Self> {
        ProjectTarget::new(path)
    }
}

impl From<ProjectTarget> for String {
    fn from(target: ProjectTarget) -> Self {
        target.0
    }
}

/// Source of install targets
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn find_projects(&self) -> Result<Vec<ProjectTarget>>;
}

/// Walks the workspace for files with the manifest extension
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    root: Option<PathBuf>,
    extension: String,
}

impl ProjectLocator {
    /// Locator over `root`; `None` means no workspace is open
    pub fn new(root: Option<PathBuf>, extension: &str) -> Self {
        ProjectLocator {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Blocking walk, sorted by path for stable presentation
    pub fn scan(&self) -> Result<Vec<ProjectTarget>> {
        let Some(root) = &self.root else {
            debug!("No workspace open, skipping project scan");
            return Ok(Vec::new());
        };
        if !root.is_dir() {
            return Err(QuickFixError::ProjectEnumeration(format!(
                "workspace root {} is not a directory",
                root.display()
            )));
        }

        let mut projects = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }
            projects.push(ProjectTarget::from_workspace_path(root, entry.path())?);
        }

        info!(
            "Found {} *.{} file(s) under {}",
            projects.len(),
            self.extension,
            root.display()
        );
        Ok(projects)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ProjectSource for ProjectLocator {
    async fn find_projects(&self) -> Result<Vec<ProjectTarget>> {
        let locator = self.clone();
        tokio::task::spawn_blocking(move || locator.scan())
            .await
            .map_err(|err| QuickFixError::ProjectEnumeration(err.to_string()))?
    }
}
