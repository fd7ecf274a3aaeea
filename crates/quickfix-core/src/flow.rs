//! Remediation flow
//!
//! The activation is an explicit state machine:
//!
//! ```text
//! MatchingDiagnostic -> Searching -> AwaitingPackagePick -> LocatingProjects
//!     -> AwaitingProjectPick -> Installing -> Done
//! ```
//!
//! Any stage may move to `Aborted`. Each call to [`SelectionOrchestrator::step`]
//! performs exactly one stage, so ordering and cancellation can be checked one
//! transition at a time. Every abort has already produced its single notice
//! (or deliberately none) by the time the state is returned.

use crate::diagnostics::{extract_symbol, Diagnostic, DiagnosticMatcher};
use crate::install::{InstallCommand, InstallInvoker};
use crate::ports::{Notifier, Picker};
use crate::projects::{ProjectSource, ProjectTarget};
use nuget_search::{PackageCandidate, PackageSearch};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PACKAGE_PLACEHOLDER: &str = "Select a package to install";
pub const PROJECT_PLACEHOLDER: &str = "Select a project to install the package into";
pub const NO_PROJECTS_MESSAGE: &str = "No project files found";

/// Why a flow ended without installing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No diagnostic with the unresolved-symbol code
    NoUnresolvedDiagnostic,
    /// Matching diagnostic had no quoted symbol
    SymbolNotExtractable,
    /// Command activated without a symbol argument
    MissingSymbol,
    /// Command id is not one this service registered
    UnknownCommand(String),
    /// Registry lookup failed (error notice emitted)
    SearchFailed,
    /// Registry returned nothing
    NoCandidates,
    PackagePickCancelled,
    /// Workspace walk failed (error notice emitted)
    ProjectLookupFailed,
    /// No manifests in the workspace (error notice emitted)
    NoProjects,
    ProjectPickCancelled,
    /// The task runner refused the command
    InstallNotStarted,
}

impl AbortReason {
    /// Whether the user was told about this abort
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            AbortReason::SearchFailed | AbortReason::ProjectLookupFailed | AbortReason::NoProjects
        )
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::NoUnresolvedDiagnostic => write!(f, "no unresolved type diagnostic"),
            AbortReason::SymbolNotExtractable => write!(f, "no symbol in diagnostic message"),
            AbortReason::MissingSymbol => write!(f, "no symbol supplied"),
            AbortReason::UnknownCommand(id) => write!(f, "unknown command {}", id),
            AbortReason::SearchFailed => write!(f, "package search failed"),
            AbortReason::NoCandidates => write!(f, "no packages found"),
            AbortReason::PackagePickCancelled => write!(f, "package selection cancelled"),
            AbortReason::ProjectLookupFailed => write!(f, "project lookup failed"),
            AbortReason::NoProjects => write!(f, "no project files found"),
            AbortReason::ProjectPickCancelled => write!(f, "project selection cancelled"),
            AbortReason::InstallNotStarted => write!(f, "install task did not start"),
        }
    }
}

/// One stage of the flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    MatchingDiagnostic { diagnostics: Vec<Diagnostic> },
    Searching { query: String },
    AwaitingPackagePick { candidates: Vec<PackageCandidate> },
    LocatingProjects { package_id: String },
    AwaitingProjectPick { package_id: String, projects: Vec<ProjectTarget> },
    Installing { package_id: String, project: ProjectTarget },
    Done(InstallCommand),
    Aborted(AbortReason),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::MatchingDiagnostic { .. } => "matching_diagnostic",
            FlowState::Searching { .. } => "searching",
            FlowState::AwaitingPackagePick { .. } => "awaiting_package_pick",
            FlowState::LocatingProjects { .. } => "locating_projects",
            FlowState::AwaitingProjectPick { .. } => "awaiting_project_pick",
            FlowState::Installing { .. } => "installing",
            FlowState::Done(_) => "done",
            FlowState::Aborted(_) => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done(_) | FlowState::Aborted(_))
    }
}

/// How an activation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Installed(InstallCommand),
    Aborted(AbortReason),
}

impl FlowOutcome {
    pub fn command(&self) -> Option<&InstallCommand> {
        match self {
            FlowOutcome::Installed(command) => Some(command),
            FlowOutcome::Aborted(_) => None,
        }
    }
}

/// Drives search, both selections and the install for one activation
pub struct SelectionOrchestrator {
    matcher: DiagnosticMatcher,
    search: Arc<dyn PackageSearch>,
    projects: Arc<dyn ProjectSource>,
    picker: Arc<dyn Picker>,
    notifier: Arc<dyn Notifier>,
    invoker: InstallInvoker,
}

impl SelectionOrchestrator {
    pub fn new(
        matcher: DiagnosticMatcher,
        search: Arc<dyn PackageSearch>,
        projects: Arc<dyn ProjectSource>,
        picker: Arc<dyn Picker>,
        notifier: Arc<dyn Notifier>,
        invoker: InstallInvoker,
    ) -> Self {
        SelectionOrchestrator {
            matcher,
            search,
            projects,
            picker,
            notifier,
            invoker,
        }
    }

    /// Run from `initial` until `Done` or `Aborted`
    pub async fn run(&self, initial: FlowState) -> FlowOutcome {
        let mut state = initial;
        loop {
            state = match state {
                FlowState::Done(command) => {
                    info!("Flow finished: {}", command);
                    return FlowOutcome::Installed(command);
                }
                FlowState::Aborted(reason) => {
                    info!("Flow aborted: {}", reason);
                    return FlowOutcome::Aborted(reason);
                }
                pending => {
                    let from = pending.name();
                    let next = self.step(pending).await;
                    debug!("Flow transition: {} -> {}", from, next.name());
                    next
                }
            };
        }
    }

    /// Entry point for a command activation carrying a symbol
    pub async fn run_for_symbol(&self, symbol: &str) -> FlowOutcome {
        self.run(FlowState::Searching {
            query: symbol.to_string(),
        })
        .await
    }

    /// Perform one stage
    pub async fn step(&self, state: FlowState) -> FlowState {
        match state {
            FlowState::MatchingDiagnostic { diagnostics } => self.match_diagnostic(&diagnostics),
            FlowState::Searching { query } => self.search_stage(&query).await,
            FlowState::AwaitingPackagePick { candidates } => self.pick_package(&candidates).await,
            FlowState::LocatingProjects { package_id } => self.locate_projects(package_id).await,
            FlowState::AwaitingProjectPick {
                package_id,
                projects,
            } => self.pick_project(package_id, projects).await,
            FlowState::Installing {
                package_id,
                project,
            } => match self.invoker.install(&package_id, &project).await {
                Ok(command) => FlowState::Done(command),
                Err(_) => FlowState::Aborted(AbortReason::InstallNotStarted),
            },
            terminal => terminal,
        }
    }

    fn match_diagnostic(&self, diagnostics: &[Diagnostic]) -> FlowState {
        let Some((_, diagnostic)) = self.matcher.first_unresolved(diagnostics) else {
            return FlowState::Aborted(AbortReason::NoUnresolvedDiagnostic);
        };
        match extract_symbol(&diagnostic.message) {
            Some(symbol) => FlowState::Searching {
                query: symbol.to_string(),
            },
            None => FlowState::Aborted(AbortReason::SymbolNotExtractable),
        }
    }

    async fn search_stage(&self, query: &str) -> FlowState {
        match search_packages(self.search.as_ref(), self.notifier.as_ref(), query).await {
            None => FlowState::Aborted(AbortReason::SearchFailed),
            Some(candidates) if candidates.is_empty() => {
                FlowState::Aborted(AbortReason::NoCandidates)
            }
            Some(candidates) => FlowState::AwaitingPackagePick { candidates },
        }
    }

    async fn pick_package(&self, candidates: &[PackageCandidate]) -> FlowState {
        if candidates.is_empty() {
            return FlowState::Aborted(AbortReason::NoCandidates);
        }
        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let Some(choice) = self.picker.pick_one(&ids, PACKAGE_PLACEHOLDER).await else {
            return FlowState::Aborted(AbortReason::PackagePickCancelled);
        };
        match ids.into_iter().find(|id| *id == choice) {
            Some(package_id) => FlowState::LocatingProjects { package_id },
            None => {
                warn!("Picker returned unknown package {}", choice);
                FlowState::Aborted(AbortReason::PackagePickCancelled)
            }
        }
    }

    async fn locate_projects(&self, package_id: String) -> FlowState {
        let mut projects = match self.projects.find_projects().await {
            Ok(projects) => projects,
            Err(err) => {
                warn!("Project lookup failed: {}", err);
                self.notifier
                    .error(&format!("Failed to find project files: {}", err))
                    .await;
                return FlowState::Aborted(AbortReason::ProjectLookupFailed);
            }
        };

        match projects.len() {
            0 => {
                self.notifier.error(NO_PROJECTS_MESSAGE).await;
                FlowState::Aborted(AbortReason::NoProjects)
            }
            1 => {
                let project = projects.remove(0);
                debug!("Single project {}, skipping prompt", project);
                FlowState::Installing {
                    package_id,
                    project,
                }
            }
            _ => FlowState::AwaitingProjectPick {
                package_id,
                projects,
            },
        }
    }

    async fn pick_project(&self, package_id: String, projects: Vec<ProjectTarget>) -> FlowState {
        let labels: Vec<String> = projects.iter().map(|p| p.as_str().to_string()).collect();
        let Some(choice) = self.picker.pick_one(&labels, PROJECT_PLACEHOLDER).await else {
            return FlowState::Aborted(AbortReason::ProjectPickCancelled);
        };
        match projects.into_iter().find(|p| p.as_str() == choice) {
            Some(project) => FlowState::Installing {
                package_id,
                project,
            },
            None => {
                warn!("Picker returned unknown project {}", choice);
                FlowState::Aborted(AbortReason::ProjectPickCancelled)
            }
        }
    }
}

/// Search and report failure to the user.
///
/// `None` means the lookup failed and exactly one error notice was emitted.
pub async fn search_packages(
    search: &dyn PackageSearch,
    notifier: &dyn Notifier,
    query: &str,
) -> Option<Vec<PackageCandidate>> {
    match search.search(query).await {
        Ok(candidates) => Some(candidates),
        Err(err) => {
            warn!("Package search for '{}' failed: {}", query, err);
            notifier
                .error(&format!("Failed to search for packages: {}", err))
                .await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::fakes::{
        RecordingNotifier, RecordingTaskRunner, ScriptedPicker, StaticProjects, StaticSearch,
    };

    struct Harness {
        search: Arc<StaticSearch>,
        projects: Arc<StaticProjects>,
        picker: Arc<ScriptedPicker>,
        notifier: Arc<RecordingNotifier>,
        runner: Arc<RecordingTaskRunner>,
        orchestrator: SelectionOrchestrator,
    }

    fn harness(search: StaticSearch, projects: StaticProjects, picker: ScriptedPicker) -> Harness {
        let search = Arc::new(search);
        let projects = Arc::new(projects);
        let picker = Arc::new(picker);
        let notifier = Arc::new(RecordingNotifier::new());
        let runner = Arc::new(RecordingTaskRunner::new());
        let invoker = InstallInvoker::new("dotnet", runner.clone(), notifier.clone());
        let orchestrator = SelectionOrchestrator::new(
            DiagnosticMatcher::new(),
            search.clone(),
            projects.clone(),
            picker.clone(),
            notifier.clone(),
            invoker,
        );
        Harness {
            search,
            projects,
            picker,
            notifier,
            runner,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_matching_stage_moves_to_search() {
        let h = harness(StaticSearch::new(&[]), StaticProjects::new(&[]), ScriptedPicker::cancelling());
        let state = FlowState::MatchingDiagnostic {
            diagnostics: vec![Diagnostic::new(
                DiagnosticCode::UnresolvedTypeOrNamespace,
                "The type or namespace name 'JObject' could not be found",
            )],
        };

        let next = h.orchestrator.step(state).await;
        assert_eq!(
            next,
            FlowState::Searching {
                query: "JObject".to_string()
            }
        );
        assert!(h.search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_matching_stage_aborts_silently() {
        let h = harness(StaticSearch::new(&[]), StaticProjects::new(&[]), ScriptedPicker::cancelling());

        let none = h
            .orchestrator
            .step(FlowState::MatchingDiagnostic {
                diagnostics: vec![Diagnostic::new(DiagnosticCode::parse("CS0103"), "'x'")],
            })
            .await;
        assert_eq!(none, FlowState::Aborted(AbortReason::NoUnresolvedDiagnostic));

        let unquoted = h
            .orchestrator
            .step(FlowState::MatchingDiagnostic {
                diagnostics: vec![Diagnostic::new(
                    DiagnosticCode::UnresolvedTypeOrNamespace,
                    "missing type",
                )],
            })
            .await;
        assert_eq!(unquoted, FlowState::Aborted(AbortReason::SymbolNotExtractable));
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_aborts_without_prompt() {
        let h = harness(StaticSearch::new(&[]), StaticProjects::new(&["App.csproj"]), ScriptedPicker::cancelling());

        let outcome = h.orchestrator.run_for_symbol("Nothing").await;
        assert_eq!(outcome, FlowOutcome::Aborted(AbortReason::NoCandidates));
        assert!(h.picker.prompts().is_empty());
        assert_eq!(h.projects.calls(), 0);
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_reports_once() {
        let h = harness(StaticSearch::failing(), StaticProjects::new(&["App.csproj"]), ScriptedPicker::cancelling());

        let outcome = h.orchestrator.run_for_symbol("JObject").await;
        assert_eq!(outcome, FlowOutcome::Aborted(AbortReason::SearchFailed));
        assert_eq!(
            h.notifier.errors(),
            vec!["Failed to search for packages: HTTP error: Network Error".to_string()]
        );
        assert!(h.picker.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_package_prompt_lists_ids_with_placeholder() {
        let h = harness(
            StaticSearch::new(&["Newtonsoft.Json", "Json.Net.Extras"]),
            StaticProjects::new(&[]),
            ScriptedPicker::cancelling(),
        );

        let next = h
            .orchestrator
            .step(FlowState::AwaitingPackagePick {
                candidates: vec![
                    PackageCandidate::new("Newtonsoft.Json"),
                    PackageCandidate::new("Json.Net.Extras"),
                ],
            })
            .await;

        assert_eq!(next, FlowState::Aborted(AbortReason::PackagePickCancelled));
        let prompts = h.picker.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].items, vec!["Newtonsoft.Json", "Json.Net.Extras"]);
        assert_eq!(prompts[0].placeholder, PACKAGE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_single_project_skips_prompt() {
        let h = harness(
            StaticSearch::new(&["Newtonsoft.Json"]),
            StaticProjects::new(&["src/App.csproj"]),
            ScriptedPicker::new(vec![Some("Newtonsoft.Json")]),
        );

        let next = h
            .orchestrator
            .step(FlowState::LocatingProjects {
                package_id: "Newtonsoft.Json".to_string(),
            })
            .await;

        assert_eq!(
            next,
            FlowState::Installing {
                package_id: "Newtonsoft.Json".to_string(),
                project: ProjectTarget::new("src/App.csproj").unwrap(),
            }
        );
        assert!(h.picker.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_no_projects_reports_once_and_installs_nothing() {
        let h = harness(
            StaticSearch::new(&["Newtonsoft.Json"]),
            StaticProjects::new(&[]),
            ScriptedPicker::new(vec![Some("Newtonsoft.Json")]),
        );

        let outcome = h.orchestrator.run_for_symbol("JObject").await;
        assert_eq!(outcome, FlowOutcome::Aborted(AbortReason::NoProjects));
        assert_eq!(h.notifier.errors(), vec![NO_PROJECTS_MESSAGE.to_string()]);
        assert!(h.notifier.infos().is_empty());
        assert!(h.runner.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_package_choice_is_treated_as_cancel() {
        let h = harness(
            StaticSearch::new(&[]),
            StaticProjects::new(&["App.csproj"]),
            ScriptedPicker::new(vec![Some("Not.From.Registry")]),
        );

        let next = h
            .orchestrator
            .step(FlowState::AwaitingPackagePick {
                candidates: vec![PackageCandidate::new("Dapper"), PackageCandidate::new("Dapper.Contrib")],
            })
            .await;
        assert_eq!(next, FlowState::Aborted(AbortReason::PackagePickCancelled));
        assert_eq!(h.projects.calls(), 0);
        assert!(h.runner.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_project_choice_is_treated_as_cancel() {
        let h = harness(
            StaticSearch::new(&[]),
            StaticProjects::new(&[]),
            ScriptedPicker::new(vec![Some("Elsewhere.csproj")]),
        );

        let next = h
            .orchestrator
            .step(FlowState::AwaitingProjectPick {
                package_id: "Dapper".to_string(),
                projects: vec![
                    ProjectTarget::new("A/A.csproj").unwrap(),
                    ProjectTarget::new("B/B.csproj").unwrap(),
                ],
            })
            .await;
        assert_eq!(next, FlowState::Aborted(AbortReason::ProjectPickCancelled));
    }

    #[tokio::test]
    async fn test_terminal_states_do_not_move() {
        let h = harness(StaticSearch::new(&[]), StaticProjects::new(&[]), ScriptedPicker::cancelling());
        let aborted = FlowState::Aborted(AbortReason::NoCandidates);
        assert_eq!(h.orchestrator.step(aborted.clone()).await, aborted);
    }

    #[test]
    fn test_reported_aborts() {
        assert!(AbortReason::SearchFailed.is_reported());
        assert!(AbortReason::NoProjects.is_reported());
        assert!(!AbortReason::PackagePickCancelled.is_reported());
        assert!(!AbortReason::NoCandidates.is_reported());
    }
}
