//! Install command construction and hand-off

use crate::error::Result;
use crate::ports::{Notifier, TaskRunner};
use crate::projects::ProjectTarget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const INSTALL_TASK_NAME: &str = "NuGet Install";
pub const INSTALL_TASK_SOURCE: &str = "NuGet";

/// A shell command handed to the task runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellTask {
    pub name: String,
    pub source: String,
    pub command_line: String,
}

/// `<tool> add "<project>" package <id>`, ready to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCommand {
    pub package_id: String,
    pub project: ProjectTarget,
    pub command_line: String,
}

impl InstallCommand {
    /// Command quoted for the shell [`ShellTaskRunner`](crate::ShellTaskRunner)
    /// uses on this platform
    pub fn new(tool: &str, package_id: &str, project: &ProjectTarget) -> Self {
        Self::for_shell(ShellFlavor::native(), tool, package_id, project)
    }

    pub fn for_shell(
        shell: ShellFlavor,
        tool: &str,
        package_id: &str,
        project: &ProjectTarget,
    ) -> Self {
        let command_line = format!(
            "{} add {} package {}",
            tool,
            shell.quote(project.as_str()),
            package_arg(shell, package_id)
        );
        InstallCommand {
            package_id: package_id.to_string(),
            project: project.clone(),
            command_line,
        }
    }

    pub fn to_task(&self) -> ShellTask {
        ShellTask {
            name: INSTALL_TASK_NAME.to_string(),
            source: INSTALL_TASK_SOURCE.to_string(),
            command_line: self.command_line.clone(),
        }
    }

    /// Informational notice shown before launch
    pub fn notice(&self) -> String {
        format!(
            "Installing NuGet package {}...\nRunning: {}",
            self.package_id, self.command_line
        )
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line)
    }
}

/// Shell that interprets a [`ShellTask`] command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh -c`
    Posix,
    /// `cmd /S /C`
    Cmd,
}

impl ShellFlavor {
    pub fn native() -> Self {
        if cfg!(windows) {
            ShellFlavor::Cmd
        } else {
            ShellFlavor::Posix
        }
    }

    /// Double-quote `value` so the shell hands it to the tool as one argument
    pub fn quote(self, value: &str) -> String {
        match self {
            ShellFlavor::Posix => quote_posix(value),
            ShellFlavor::Cmd => quote_cmd(value),
        }
    }
}

/// Inside double quotes a POSIX shell still interprets `"`, `\`, `$` and
/// backquote; each gets a backslash.
fn quote_posix(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// cmd has no backslash escapes and expands `%VAR%` even inside quotes.
/// A `%` is moved outside the quotes and caret-escaped (`"^%"`); the
/// argument parser rejoins the adjacent quoted pieces. `"` doubles to `""`.
fn quote_cmd(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '%' => quoted.push_str("\"^%\""),
            '"' => quoted.push_str("\"\""),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// NuGet ids are `[A-Za-z0-9._-]`; those go through bare, anything else is quoted.
fn package_arg(shell: ShellFlavor, package_id: &str) -> String {
    let plain = !package_id.is_empty()
        && package_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        package_id.to_string()
    } else {
        shell.quote(package_id)
    }
}

/// Builds the install command, announces it, and launches it
pub struct InstallInvoker {
    tool: String,
    runner: Arc<dyn TaskRunner>,
    notifier: Arc<dyn Notifier>,
}

impl InstallInvoker {
    pub fn new(tool: &str, runner: Arc<dyn TaskRunner>, notifier: Arc<dyn Notifier>) -> Self {
        InstallInvoker {
            tool: tool.to_string(),
            runner,
            notifier,
        }
    }

    pub fn command_for(&self, package_id: &str, project: &ProjectTarget) -> InstallCommand {
        InstallCommand::new(&self.tool, package_id, project)
    }

    /// Announce and launch. The process outcome belongs to the task runner.
    pub async fn install(&self, package_id: &str, project: &ProjectTarget) -> Result<InstallCommand> {
        let command = self.command_for(package_id, project);
        self.notifier.info(&command.notice()).await;

        info!("Launching install task: {}", command);
        if let Err(err) = self.runner.execute(command.to_task()).await {
            warn!("Install task did not start: {}", err);
            return Err(err);
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingNotifier, RecordingTaskRunner};

    fn project(path: &str) -> ProjectTarget {
        ProjectTarget::new(path).unwrap()
    }

    #[test]
    fn test_install_command_exact_form() {
        let command = InstallCommand::new("dotnet", "Newtonsoft.Json", &project("src/App.csproj"));
        assert_eq!(
            command.command_line,
            "dotnet add \"src/App.csproj\" package Newtonsoft.Json"
        );
    }

    #[test]
    fn test_project_path_with_spaces_and_metacharacters_stays_one_argument() {
        let command = InstallCommand::for_shell(
            ShellFlavor::Posix,
            "dotnet",
            "Serilog",
            &project("My Apps/$HOME `x` \"q\"/App.csproj"),
        );
        assert_eq!(
            command.command_line,
            "dotnet add \"My Apps/\\$HOME \\`x\\` \\\"q\\\"/App.csproj\" package Serilog"
        );
    }

    #[test]
    fn test_unusual_package_id_is_quoted() {
        let command = InstallCommand::for_shell(
            ShellFlavor::Posix,
            "dotnet",
            "evil; rm -rf /",
            &project("App.csproj"),
        );
        assert_eq!(
            command.command_line,
            "dotnet add \"App.csproj\" package \"evil; rm -rf /\""
        );
    }

    #[test]
    fn test_cmd_quoting_has_no_backslash_escapes() {
        let command = InstallCommand::for_shell(
            ShellFlavor::Cmd,
            "dotnet",
            "Newtonsoft.Json",
            &project("My$App/App.csproj"),
        );
        assert_eq!(
            command.command_line,
            "dotnet add \"My$App/App.csproj\" package Newtonsoft.Json"
        );
    }

    #[test]
    fn test_cmd_quoting_keeps_percent_out_of_expansion() {
        assert_eq!(
            ShellFlavor::Cmd.quote("%USERPROFILE%/App.csproj"),
            "\"\"^%\"USERPROFILE\"^%\"/App.csproj\""
        );
        assert_eq!(ShellFlavor::Cmd.quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_native_command_matches_platform_shell() {
        let native = InstallCommand::new("dotnet", "Dapper", &project("App.csproj"));
        let expected =
            InstallCommand::for_shell(ShellFlavor::native(), "dotnet", "Dapper", &project("App.csproj"));
        assert_eq!(native, expected);
        assert_eq!(native.command_line, "dotnet add \"App.csproj\" package Dapper");
    }

    #[test]
    fn test_custom_tool() {
        let command = InstallCommand::new("/usr/local/bin/dotnet", "Dapper", &project("App.csproj"));
        assert!(command.command_line.starts_with("/usr/local/bin/dotnet add "));
    }

    #[tokio::test]
    async fn test_install_announces_then_launches() {
        let runner = Arc::new(RecordingTaskRunner::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let invoker = InstallInvoker::new("dotnet", runner.clone(), notifier.clone());

        let command = invoker
            .install("Newtonsoft.Json", &project("src/App.csproj"))
            .await
            .unwrap();

        let tasks = runner.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, INSTALL_TASK_NAME);
        assert_eq!(tasks[0].source, INSTALL_TASK_SOURCE);
        assert_eq!(tasks[0].command_line, command.command_line);

        let infos = notifier.infos();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].contains("Newtonsoft.Json"));
        assert!(infos[0].ends_with("Running: dotnet add \"src/App.csproj\" package Newtonsoft.Json"));
        assert!(notifier.errors().is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_is_returned() {
        let runner = Arc::new(RecordingTaskRunner::failing());
        let notifier = Arc::new(RecordingNotifier::new());
        let invoker = InstallInvoker::new("dotnet", runner.clone(), notifier.clone());

        let result = invoker.install("Dapper", &project("App.csproj")).await;
        assert!(result.is_err());
        assert!(runner.tasks().is_empty());
    }
}
