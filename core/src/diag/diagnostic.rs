use crate::scan::BlockKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DiagnosticKind {
    UnmatchedBlock(BlockKind),
    UndeclaredVariableUse(String),
    UnusedDeclaration(String),
}

impl DiagnosticKind {
    /// Stable short code, used by the CLI and the text rendering.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnmatchedBlock(_) => "unmatched-block",
            DiagnosticKind::UndeclaredVariableUse(_) => "undeclared-variable",
            DiagnosticKind::UnusedDeclaration(_) => "unused-declaration",
        }
    }
}

/// A structural finding about the source. Not a processing failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub related_name: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: String, line: u32, column: u32) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message,
            related_name: None,
            line,
            column,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: String, line: u32, column: u32) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message,
            related_name: None,
            line,
            column,
        }
    }

    pub fn with_related_name(mut self, name: Option<String>) -> Self {
        self.related_name = name;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.line,
            self.column,
            self.severity,
            self.kind.code(),
            self.message
        )
    }
}
