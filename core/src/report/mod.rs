use crate::decl::{Comment, Declaration, DeclarationTable};
use crate::diag::{Diagnostic, DiagnosticSet};
use crate::scan::{BlockConstruct, BlockKind, BlockScan, ProcedureKind};
use serde::Serialize;
use std::collections::BTreeMap;

mod render;

#[cfg(test)]
mod report_test;

pub use render::ReportFormat;

/// Everything one analysis call produces. Each sequence is in source order;
/// diagnostics are ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralReport {
    pub comments: Vec<Comment>,
    pub variables: Vec<Declaration>,
    pub functions: Vec<BlockConstruct>,
    pub subroutines: Vec<BlockConstruct>,
    pub properties: Vec<BlockConstruct>,
    pub loops: Vec<BlockConstruct>,
    pub conditionals: Vec<BlockConstruct>,
    pub error_handling: Vec<BlockConstruct>,
    pub classes: Vec<BlockConstruct>,
    pub diagnostics: Vec<Diagnostic>,
    pub unmatched_summary: BTreeMap<String, usize>,
    pub option_explicit: bool,
}

impl StructuralReport {
    /// Group the upstream outputs. No analysis happens here.
    pub fn assemble(blocks: BlockScan, decls: DeclarationTable, diags: DiagnosticSet) -> Self {
        let mut report = StructuralReport {
            comments: decls.comments,
            variables: decls.declarations,
            functions: Vec::new(),
            subroutines: Vec::new(),
            properties: Vec::new(),
            loops: Vec::new(),
            conditionals: Vec::new(),
            error_handling: Vec::new(),
            classes: Vec::new(),
            diagnostics: diags.diagnostics,
            unmatched_summary: diags.unmatched_summary,
            option_explicit: decls.option_explicit,
        };
        for block in blocks.constructs {
            let bucket = match block.kind {
                BlockKind::Procedure(ProcedureKind::Function) => &mut report.functions,
                BlockKind::Procedure(ProcedureKind::Sub) => &mut report.subroutines,
                BlockKind::Procedure(ProcedureKind::Property) => &mut report.properties,
                BlockKind::Loop(_) => &mut report.loops,
                BlockKind::Conditional => &mut report.conditionals,
                BlockKind::ErrorHandler => &mut report.error_handling,
                BlockKind::Class => &mut report.classes,
            };
            bucket.push(block);
        }
        // Stable: diagnostics at the same position keep their upstream order.
        report.diagnostics.sort_by_key(|d| (d.line, d.column));
        report
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}
