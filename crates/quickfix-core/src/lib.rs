//! NuGet Quick-Fix Core
//!
//! Turns an unresolved type/namespace diagnostic (`CS0246`) into a package
//! install: match the diagnostic, search the registry, let the user pick a
//! package and a project, then hand `dotnet add ... package ...` to the task
//! runner.
//!
//! Hosts provide the UI and process ports (see [`ports`]) and wire everything
//! through [`QuickFixService`].

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fakes;
pub mod flow;
pub mod install;
pub mod ports;
pub mod projects;
pub mod runner;
pub mod service;
pub mod telemetry;

pub use config::QuickFixConfig;
pub use diagnostics::{
    extract_symbol, CodeAction, CodeActionKind, CommandRef, Diagnostic, DiagnosticCode,
    DiagnosticMatcher, Position, Range, RemediationAction, SEARCH_COMMAND,
    UNRESOLVED_TYPE_OR_NAMESPACE,
};
pub use error::{QuickFixError, Result};
pub use flow::{search_packages, AbortReason, FlowOutcome, FlowState, SelectionOrchestrator};
pub use install::{InstallCommand, InstallInvoker, ShellFlavor, ShellTask};
pub use ports::{Notifier, Picker, TaskRunner};
pub use projects::{ProjectLocator, ProjectSource, ProjectTarget};
pub use runner::{ShellTaskRunner, TaskExit};
pub use service::{QuickFixPorts, QuickFixService, Registration};

pub use nuget_search::{PackageCandidate, PackageSearch, RegistryClient, SearchConfig, SearchError};
