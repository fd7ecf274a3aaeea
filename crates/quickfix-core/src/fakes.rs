//! In-memory fakes for the host ports (testing only)
//!
//! Provides `RecordingNotifier`, `ScriptedPicker`, `RecordingTaskRunner`,
//! `StaticSearch` and `StaticProjects`. Each records how it was called so
//! ordering and notice counts can be asserted directly.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use nuget_search::{PackageCandidate, PackageSearch, SearchError};

use crate::error::{QuickFixError, Result};
use crate::install::ShellTask;
use crate::ports::{Notifier, Picker, TaskRunner};
use crate::projects::{ProjectSource, ProjectTarget};

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Info(message) => Some(message),
                Notice::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(message) => Some(message),
                Notice::Info(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn info(&self, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::Info(message.to_string()));
    }

    async fn error(&self, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push(Notice::Error(message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// ScriptedPicker
// ---------------------------------------------------------------------------

/// A prompt the picker was shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub items: Vec<String>,
    pub placeholder: String,
}

/// Answers prompts from a script; `None` entries (or an exhausted script)
/// behave like the user dismissing the prompt.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    answers: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedPicker {
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        ScriptedPicker {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Dismisses every prompt
    pub fn cancelling() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Picker for ScriptedPicker {
    async fn pick_one(&self, items: &[String], placeholder: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(Prompt {
            items: items.to_vec(),
            placeholder: placeholder.to_string(),
        });
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

// ---------------------------------------------------------------------------
// RecordingTaskRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingTaskRunner {
    tasks: Mutex<Vec<ShellTask>>,
    fail_launch: bool,
}

impl RecordingTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses to launch anything
    pub fn failing() -> Self {
        RecordingTaskRunner {
            tasks: Mutex::new(Vec::new()),
            fail_launch: true,
        }
    }

    pub fn tasks(&self) -> Vec<ShellTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskRunner for RecordingTaskRunner {
    async fn execute(&self, task: ShellTask) -> Result<()> {
        if self.fail_launch {
            return Err(QuickFixError::TaskLaunch {
                task: task.name,
                reason: "launch refused by fake".to_string(),
            });
        }
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StaticSearch
// ---------------------------------------------------------------------------

/// Fixed search results, or a transport failure when built with `failing`
#[derive(Debug, Default)]
pub struct StaticSearch {
    candidates: Option<Vec<PackageCandidate>>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(ids: &[&str]) -> Self {
        StaticSearch {
            candidates: Some(ids.iter().map(|id| PackageCandidate::new(*id)).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        StaticSearch {
            candidates: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageSearch for StaticSearch {
    async fn search(&self, query: &str) -> nuget_search::Result<Vec<PackageCandidate>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.candidates
            .clone()
            .ok_or_else(|| SearchError::Http("Network Error".to_string()))
    }
}

// ---------------------------------------------------------------------------
// StaticProjects
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StaticProjects {
    projects: Vec<ProjectTarget>,
    calls: Mutex<usize>,
}

impl StaticProjects {
    pub fn new(paths: &[&str]) -> Self {
        StaticProjects {
            projects: paths
                .iter()
                .filter_map(|p| ProjectTarget::new(*p).ok())
                .collect(),
            calls: Mutex::new(0),
        }
    }

    /// How many times the flow asked for projects
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ProjectSource for StaticProjects {
    async fn find_projects(&self) -> Result<Vec<ProjectTarget>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.projects.clone())
    }
}
