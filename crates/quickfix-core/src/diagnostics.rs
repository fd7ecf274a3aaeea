//! Diagnostic model and matching
//!
//! Diagnostics arrive from the host as loosely-typed JSON. The classification
//! code is decoded once, at deserialization, into [`DiagnosticCode`]; anything
//! unrecognised becomes `Other` or `Absent` and simply never matches.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Compiler code for "type or namespace name could not be found"
pub const UNRESOLVED_TYPE_OR_NAMESPACE: &str = "CS0246";

/// Command activated by the quick-fix action
pub const SEARCH_COMMAND: &str = "extension.searchNuget";
pub const SEARCH_COMMAND_TITLE: &str = "Search NuGet";

const SYMBOL_DELIMITER: char = '\'';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Typed diagnostic classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// `CS0246`
    UnresolvedTypeOrNamespace,
    /// Any other code, kept verbatim
    Other(String),
    /// No code, or a payload shape we do not understand
    #[default]
    Absent,
}

impl DiagnosticCode {
    /// Exact, case-sensitive match on the compiler's code
    pub fn parse(code: &str) -> Self {
        if code.trim().is_empty() {
            DiagnosticCode::Absent
        } else if code == UNRESOLVED_TYPE_OR_NAMESPACE {
            DiagnosticCode::UnresolvedTypeOrNamespace
        } else {
            DiagnosticCode::Other(code.to_string())
        }
    }

    /// Decode a host payload: a string, a number, or `{ "value": ..., "target": ... }`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(code) => Self::parse(code),
            Value::Number(code) => DiagnosticCode::Other(code.to_string()),
            Value::Object(fields) => fields
                .get("value")
                .map(Self::from_value)
                .unwrap_or_default(),
            _ => DiagnosticCode::Absent,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DiagnosticCode::UnresolvedTypeOrNamespace => Some(UNRESOLVED_TYPE_OR_NAMESPACE),
            DiagnosticCode::Other(code) => Some(code),
            DiagnosticCode::Absent => None,
        }
    }
}

impl<'de> Deserialize<'de> for DiagnosticCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(DiagnosticCode::from_value(&value))
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.as_str() {
            Some(code) => serializer.serialize_str(code),
            None => serializer.serialize_none(),
        }
    }
}

/// Snapshot of one host diagnostic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub code: DiagnosticCode,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub range: Range,
    #[serde(default)]
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn is_unresolved_symbol(&self) -> bool {
        self.code == DiagnosticCode::UnresolvedTypeOrNamespace
    }
}

/// Text between the first and second `'` of a message.
///
/// Best effort: a symbol that itself contains `'` is cut short, and an empty
/// segment counts as no symbol.
pub fn extract_symbol(message: &str) -> Option<&str> {
    let mut segments = message.split(SYMBOL_DELIMITER);
    segments.next()?;
    segments.next().filter(|symbol| !symbol.is_empty())
}

/// A remediation found for one diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationAction {
    pub symbol: String,
    /// Index of the triggering diagnostic in the host-supplied slice
    pub diagnostic_index: usize,
    pub range: Range,
}

impl RemediationAction {
    pub fn title(&self) -> String {
        format!("Search for NuGet package to resolve '{}'", self.symbol)
    }

    /// Host-facing descriptor for this remediation
    pub fn to_code_action(&self) -> CodeAction {
        CodeAction {
            title: self.title(),
            kind: CodeActionKind::QuickFix,
            command: CommandRef {
                command: SEARCH_COMMAND.to_string(),
                title: SEARCH_COMMAND_TITLE.to_string(),
                arguments: vec![Value::String(self.symbol.clone())],
            },
            range: self.range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeActionKind {
    #[serde(rename = "quickfix")]
    QuickFix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRef {
    pub command: String,
    pub title: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAction {
    pub title: String,
    pub kind: CodeActionKind,
    pub command: CommandRef,
    pub range: Range,
}

/// Finds the first unresolved-symbol diagnostic and extracts its symbol
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticMatcher;

impl DiagnosticMatcher {
    pub fn new() -> Self {
        DiagnosticMatcher
    }

    /// First unresolved-symbol diagnostic, in host order
    pub fn first_unresolved<'a>(&self, diagnostics: &'a [Diagnostic]) -> Option<(usize, &'a Diagnostic)> {
        diagnostics
            .iter()
            .enumerate()
            .find(|(_, diagnostic)| diagnostic.is_unresolved_symbol())
    }

    /// At most one remediation for the diagnostics attached to a range
    pub fn match_diagnostics(&self, diagnostics: &[Diagnostic]) -> Option<RemediationAction> {
        let (index, diagnostic) = self.first_unresolved(diagnostics)?;
        let symbol = extract_symbol(&diagnostic.message)?;
        Some(RemediationAction {
            symbol: symbol.to_string(),
            diagnostic_index: index,
            range: diagnostic.range,
        })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
