//! nuget-fix - resolve missing C# types by installing NuGet packages
//!
//! ## Commands
//!
//! - `actions`: print the quick-fix actions offered for a diagnostics file
//! - `fix`: match a diagnostics file and run the whole install flow
//! - `search`: run the flow for a symbol name directly
//! - `projects`: list the project manifests an install could target

mod host;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quickfix_core::{
    telemetry, Diagnostic, FlowOutcome, Picker, ProjectLocator, ProjectSource, QuickFixConfig,
    QuickFixPorts, QuickFixService, RegistryClient, SearchConfig, ShellTaskRunner,
    SEARCH_COMMAND,
};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use host::{DialoguerPicker, FirstChoicePicker, TerminalNotifier};

#[derive(Parser)]
#[command(name = "nuget-fix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find and install NuGet packages for unresolved C# types", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Workspace root to search for project files
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// NuGet search service base URL
    #[arg(long, global = true, env = "NUGET_SEARCH_URL")]
    registry_url: Option<String>,

    /// Maximum number of packages offered (1 to 5)
    #[arg(long, global = true, env = "NUGET_SEARCH_MAX_RESULTS")]
    max_results: Option<usize>,

    /// Package-manager executable
    #[arg(long, global = true, env = "NUGET_QUICKFIX_TOOL")]
    tool: Option<String>,

    /// Project manifest extension
    #[arg(long, global = true, env = "NUGET_QUICKFIX_MANIFEST_EXT")]
    manifest_ext: Option<String>,

    /// Take the first package and project instead of prompting
    #[arg(long, global = true)]
    pick_first: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print quick-fix actions for diagnostics (JSON array, `-` for stdin)
    Actions {
        #[arg(short, long)]
        diagnostics: PathBuf,

        /// Language id of the document the diagnostics belong to
        #[arg(short, long, default_value = "csharp")]
        language: String,
    },

    /// Match diagnostics and install a package for the first unresolved type
    Fix {
        #[arg(short, long)]
        diagnostics: PathBuf,
    },

    /// Search for and install a package providing SYMBOL
    Search {
        symbol: String,
    },

    /// List project files in the workspace
    Projects,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.json, level);

    let config = build_config(&cli);

    match &cli.command {
        Commands::Actions {
            diagnostics,
            language,
        } => cmd_actions(&cli, config, diagnostics, language).await,
        Commands::Fix { diagnostics } => cmd_fix(&cli, config, diagnostics).await,
        Commands::Search { symbol } => cmd_search(&cli, config, symbol).await,
        Commands::Projects => cmd_projects(&cli, &config).await,
    }
}

fn build_config(cli: &Cli) -> QuickFixConfig {
    let mut search = match &cli.registry_url {
        Some(url) => SearchConfig::new(url),
        None => SearchConfig::from_env(),
    };
    if let Some(max_results) = cli.max_results {
        search = search.with_max_results(max_results);
    }

    let mut config = QuickFixConfig::from_env().with_search(search);
    if let Some(tool) = &cli.tool {
        config = config.with_tool(tool);
    }
    if let Some(ext) = &cli.manifest_ext {
        config = config.with_manifest_extension(ext);
    }
    config
}

/// Wire the service with terminal ports; the runner is returned so the
/// caller can wait for launched installs before exiting.
fn start_service(cli: &Cli, config: QuickFixConfig) -> Result<(QuickFixService, Arc<ShellTaskRunner>)> {
    let client = RegistryClient::new(config.search.clone())
        .context("Failed to create registry client")?;
    let locator = ProjectLocator::new(Some(cli.workspace.clone()), &config.manifest_extension);
    let runner = Arc::new(ShellTaskRunner::new(Some(cli.workspace.clone())));
    let picker: Arc<dyn Picker> = if cli.pick_first {
        Arc::new(FirstChoicePicker)
    } else {
        Arc::new(DialoguerPicker)
    };

    let service = QuickFixService::activate(
        config,
        QuickFixPorts {
            search: Arc::new(client),
            projects: Arc::new(locator),
            picker,
            notifier: Arc::new(TerminalNotifier),
            runner: runner.clone(),
        },
    );
    Ok((service, runner))
}

fn read_diagnostics(path: &Path) -> Result<Vec<Diagnostic>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diagnostics from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diagnostics from {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Diagnostics must be a JSON array of diagnostics")
}

async fn finish(service: QuickFixService, runner: &ShellTaskRunner, outcome: FlowOutcome) -> Result<()> {
    service.deactivate();
    match outcome {
        FlowOutcome::Installed(command) => {
            info!("Waiting for `{}`", command);
            for exit in runner.wait_all().await {
                match exit.exit_code {
                    Some(code) => println!("{} exited with code {}", exit.task_name, code),
                    None => println!("{} was terminated", exit.task_name),
                }
            }
        }
        FlowOutcome::Aborted(reason) => info!("Nothing installed: {}", reason),
    }
    Ok(())
}

async fn cmd_actions(cli: &Cli, config: QuickFixConfig, diagnostics: &Path, language: &str) -> Result<()> {
    let diagnostics = read_diagnostics(diagnostics)?;
    let (service, _runner) = start_service(cli, config)?;

    let actions = service.provide_code_actions(language, &diagnostics);
    println!("{}", serde_json::to_string_pretty(&actions)?);

    service.deactivate();
    Ok(())
}

async fn cmd_fix(cli: &Cli, config: QuickFixConfig, diagnostics: &Path) -> Result<()> {
    let diagnostics = read_diagnostics(diagnostics)?;
    let (service, runner) = start_service(cli, config)?;

    let language = service.config().language_id.clone();
    if let Some(action) = service.provide_code_actions(&language, &diagnostics).first() {
        println!("{}", action.title);
    }

    let outcome = service.resolve(diagnostics).await;
    finish(service, &runner, outcome).await
}

async fn cmd_search(cli: &Cli, config: QuickFixConfig, symbol: &str) -> Result<()> {
    let (service, runner) = start_service(cli, config)?;
    let outcome = service
        .execute_command(SEARCH_COMMAND, &[Value::String(symbol.to_string())])
        .await;
    finish(service, &runner, outcome).await
}

async fn cmd_projects(cli: &Cli, config: &QuickFixConfig) -> Result<()> {
    let locator = ProjectLocator::new(Some(cli.workspace.clone()), &config.manifest_extension);
    let projects = locator
        .find_projects()
        .await
        .with_context(|| format!("Failed to scan {}", cli.workspace.display()))?;

    if projects.is_empty() {
        println!("No *.{} files under {}", config.manifest_extension, cli.workspace.display());
    }
    for project in projects {
        println!("{}", project);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from(["nuget-fix", "--pick-first", "search", "JObject"]).unwrap();
        assert!(cli.pick_first);
        assert!(matches!(cli.command, Commands::Search { ref symbol } if symbol == "JObject"));
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let cli = Cli::try_parse_from([
            "nuget-fix",
            "--registry-url",
            "http://localhost:5555",
            "--max-results",
            "3",
            "--tool",
            "/opt/dotnet/dotnet",
            "--manifest-ext",
            ".fsproj",
            "projects",
        ])
        .unwrap();

        let config = build_config(&cli);
        assert_eq!(config.search.registry_url, "http://localhost:5555");
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.tool, "/opt/dotnet/dotnet");
        assert_eq!(config.manifest_extension, "fsproj");
    }

    #[test]
    fn test_max_results_flag_cannot_exceed_five() {
        let cli = Cli::try_parse_from(["nuget-fix", "--max-results", "50", "projects"]).unwrap();
        assert_eq!(build_config(&cli).search.max_results, 5);
    }

    #[test]
    fn test_read_diagnostics_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagnostics.json");
        std::fs::write(
            &path,
            r#"[{"code": {"value": "CS0246"}, "message": "The type or namespace name 'JObject' could not be found"}]"#,
        )
        .unwrap();

        let diagnostics = read_diagnostics(&path).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_unresolved_symbol());
    }

    #[test]
    fn test_read_diagnostics_rejects_non_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagnostics.json");
        std::fs::write(&path, r#"{"message": "x"}"#).unwrap();
        assert!(read_diagnostics(&path).is_err());
    }
}
