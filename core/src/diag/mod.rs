//! Structural diagnostics: unmatched blocks (raised by the block scanner),
//! undeclared variable uses, and unused declarations.

mod builtins;
mod diagnostic;
mod engine;

#[cfg(test)]
mod diag_test;

pub use builtins::Builtins;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use engine::{DiagnosticEngine, DiagnosticSet};
