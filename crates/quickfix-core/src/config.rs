//! Pipeline configuration

use nuget_search::SearchConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE_ID: &str = "csharp";
pub const DEFAULT_TOOL: &str = "dotnet";
pub const DEFAULT_MANIFEST_EXTENSION: &str = "csproj";

/// Settings shared by every component wired into [`crate::QuickFixService`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickFixConfig {
    /// Documents of this language get quick-fix actions
    pub language_id: String,
    /// Package-manager executable used in the install command
    pub tool: String,
    /// Project manifest extension, without the leading dot
    pub manifest_extension: String,
    /// Registry client settings
    pub search: SearchConfig,
}

impl Default for QuickFixConfig {
    fn default() -> Self {
        QuickFixConfig {
            language_id: DEFAULT_LANGUAGE_ID.to_string(),
            tool: std::env::var("NUGET_QUICKFIX_TOOL")
                .unwrap_or_else(|_| DEFAULT_TOOL.to_string()),
            manifest_extension: std::env::var("NUGET_QUICKFIX_MANIFEST_EXT")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or_else(|_| DEFAULT_MANIFEST_EXTENSION.to_string()),
            search: SearchConfig::from_env(),
        }
    }
}

impl QuickFixConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = tool.to_string();
        self
    }

    pub fn with_manifest_extension(mut self, extension: &str) -> Self {
        self.manifest_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}
