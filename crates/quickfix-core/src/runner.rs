//! Shell task runner
//!
//! Launches a [`ShellTask`] through the platform shell and watches it from a
//! background task. The exit status is only logged: reporting install success
//! or failure is this runner's job, not the pipeline's.

use crate::error::{QuickFixError, Result};
use crate::install::ShellTask;
use crate::ports::TaskRunner;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Result of a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskExit {
    pub task_name: String,
    /// `None` when killed by a signal or the wait itself failed
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs tasks with `sh -c` (or `cmd /S /C` on Windows) in the workspace root.
///
/// Finished watchers are dropped on the next launch, so a long-lived host
/// that never calls [`ShellTaskRunner::wait_all`] keeps at most the tasks
/// still running plus one.
#[derive(Debug, Default)]
pub struct ShellTaskRunner {
    cwd: Option<PathBuf>,
    running: Mutex<Vec<JoinHandle<TaskExit>>>,
}

impl ShellTaskRunner {
    pub fn new(cwd: Option<PathBuf>) -> Self {
        ShellTaskRunner {
            cwd,
            running: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every launched task not yet dropped. For hosts that exit
    /// after one activation.
    pub async fn wait_all(&self) -> Vec<TaskExit> {
        let handles = {
            let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut *running)
        };

        let mut exits = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(exit) => exits.push(exit),
                Err(err) => warn!("Task watcher ended abnormally: {}", err),
            }
        }
        exits
    }

    /// Command lines are quoted for [`ShellFlavor::native`], so the shell
    /// chosen here must match it.
    ///
    /// [`ShellFlavor::native`]: crate::install::ShellFlavor::native
    #[cfg(not(windows))]
    fn shell_command(command_line: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", command_line]);
        command
    }

    /// `args` would re-quote the line for the MSVC argument parser and mangle
    /// the quoting cmd expects, so the line is appended raw. `/S` makes cmd
    /// strip exactly the outer pair of quotes.
    #[cfg(windows)]
    fn shell_command(command_line: &str) -> Command {
        let mut command = Command::new("cmd");
        command.raw_arg(format!("/S /C \"{}\"", command_line));
        command
    }

    /// Number of watchers not yet collected
    pub fn pending(&self) -> usize {
        self.running.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl TaskRunner for ShellTaskRunner {
    async fn execute(&self, task: ShellTask) -> Result<()> {
        let mut command = Self::shell_command(&task.command_line);
        command.stdin(Stdio::null());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|err| {
            error!("[{}] {} failed to start: {}", task.source, task.name, err);
            QuickFixError::TaskLaunch {
                task: task.name.clone(),
                reason: err.to_string(),
            }
        })?;
        info!("[{}] {} started: {}", task.source, task.name, task.command_line);

        let handle = tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    if status.success() {
                        info!("[{}] {} finished successfully", task.source, task.name);
                    } else {
                        error!("[{}] {} failed: {}", task.source, task.name, status);
                    }
                    TaskExit {
                        task_name: task.name,
                        exit_code: status.code(),
                        success: status.success(),
                    }
                }
                Err(err) => {
                    error!("[{}] {} could not be awaited: {}", task.source, task.name, err);
                    TaskExit {
                        task_name: task.name,
                        exit_code: None,
                        success: false,
                    }
                }
            }
        });

        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        running.retain(|watcher| !watcher.is_finished());
        running.push(handle);
        Ok(())
    }
}
