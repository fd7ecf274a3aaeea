//! Composition root
//!
//! [`QuickFixService::activate`] wires the matcher, search client, locator,
//! orchestrator and invoker from explicitly supplied ports and records what it
//! registered with the host. [`QuickFixService::deactivate`] releases those
//! registrations; dropping an active service releases them too.

use crate::config::QuickFixConfig;
use crate::diagnostics::{CodeAction, Diagnostic, DiagnosticMatcher, SEARCH_COMMAND};
use crate::flow::{AbortReason, FlowOutcome, FlowState, SelectionOrchestrator};
use crate::install::InstallInvoker;
use crate::ports::{Notifier, Picker, TaskRunner};
use crate::projects::ProjectSource;
use nuget_search::PackageSearch;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators supplied by the host
pub struct QuickFixPorts {
    pub search: Arc<dyn PackageSearch>,
    pub projects: Arc<dyn ProjectSource>,
    pub picker: Arc<dyn Picker>,
    pub notifier: Arc<dyn Notifier>,
    pub runner: Arc<dyn TaskRunner>,
}

/// Something the service registered with the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    CodeActionProvider { language_id: String },
    Command { id: String },
}

pub struct QuickFixService {
    config: QuickFixConfig,
    matcher: DiagnosticMatcher,
    orchestrator: SelectionOrchestrator,
    registrations: Vec<Registration>,
}

impl QuickFixService {
    pub fn activate(config: QuickFixConfig, ports: QuickFixPorts) -> Self {
        let matcher = DiagnosticMatcher::new();
        let invoker = InstallInvoker::new(&config.tool, ports.runner, ports.notifier.clone());
        let orchestrator = SelectionOrchestrator::new(
            matcher,
            ports.search,
            ports.projects,
            ports.picker,
            ports.notifier,
            invoker,
        );

        let registrations = vec![
            Registration::CodeActionProvider {
                language_id: config.language_id.clone(),
            },
            Registration::Command {
                id: SEARCH_COMMAND.to_string(),
            },
        ];
        for registration in &registrations {
            info!("Registered {:?}", registration);
        }

        QuickFixService {
            config,
            matcher,
            orchestrator,
            registrations,
        }
    }

    pub fn config(&self) -> &QuickFixConfig {
        &self.config
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn is_active(&self) -> bool {
        !self.registrations.is_empty()
    }

    /// Code actions for the diagnostics attached to a range.
    ///
    /// Empty for other languages, for unrelated diagnostics, and after
    /// deactivation.
    pub fn provide_code_actions(&self, language_id: &str, diagnostics: &[Diagnostic]) -> Vec<CodeAction> {
        if !self.is_active() || language_id != self.config.language_id {
            return Vec::new();
        }
        self.matcher
            .match_diagnostics(diagnostics)
            .map(|action| {
                debug!("Offering quick fix for '{}'", action.symbol);
                vec![action.to_code_action()]
            })
            .unwrap_or_default()
    }

    /// Handle a command activation from the host
    pub async fn execute_command(&self, command: &str, arguments: &[Value]) -> FlowOutcome {
        if !self.is_active() || command != SEARCH_COMMAND {
            return FlowOutcome::Aborted(AbortReason::UnknownCommand(command.to_string()));
        }
        let symbol = arguments
            .first()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match symbol {
            Some(symbol) => self.orchestrator.run_for_symbol(symbol).await,
            None => FlowOutcome::Aborted(AbortReason::MissingSymbol),
        }
    }

    /// Match and, if something matched, run the whole flow
    pub async fn resolve(&self, diagnostics: Vec<Diagnostic>) -> FlowOutcome {
        self.orchestrator
            .run(FlowState::MatchingDiagnostic { diagnostics })
            .await
    }

    /// Release host registrations
    pub fn deactivate(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for registration in self.registrations.drain(..) {
            info!("Released {:?}", registration);
        }
    }
}

impl Drop for QuickFixService {
    fn drop(&mut self) {
        self.release();
    }
}
