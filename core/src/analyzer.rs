//! The analysis pipeline: tokenize, scan blocks, collect declarations, run the
//! diagnostic checks, assemble the report.

use crate::config::AnalyzerConfig;
use crate::decl::DeclarationCollector;
use crate::diag::{Builtins, DiagnosticEngine};
use crate::error::AnalysisError;
use crate::report::StructuralReport;
use crate::scan::BlockScanner;
use crate::token::Tokenizer;

#[cfg(test)]
mod analyzer_test;

/// Holds only immutable configuration, so one instance can serve any number of
/// independent calls.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
    builtins: Builtins,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let builtins = Builtins::new(&config.extra_builtins);
        Self { config, builtins }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, source: &str) -> Result<StructuralReport, AnalysisError> {
        self.check_input(source)?;

        let tokens = Tokenizer::tokenize(source);
        tracing::debug!(tokens = tokens.len(), bytes = source.len(), "tokenized");
        let blocks = BlockScanner::scan(&tokens, source);
        let decls = DeclarationCollector::collect(&tokens, &blocks);
        let diags = DiagnosticEngine::new(&tokens, &blocks, &decls, &self.builtins)
            .strict(self.config.strict_undeclared)
            .run();

        let report = StructuralReport::assemble(blocks, decls, diags);
        tracing::debug!(
            diagnostics = report.diagnostics.len(),
            errors = report.error_count(),
            "report assembled"
        );
        Ok(report)
    }

    fn check_input(&self, source: &str) -> Result<(), AnalysisError> {
        let limit = self.config.max_input_bytes;
        if source.len() > limit {
            return Err(AnalysisError::InputTooLarge {
                size: source.len(),
                limit,
            });
        }
        if source.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        Ok(())
    }
}

/// Analyze `source` with the default configuration.
pub fn analyze(source: &str) -> Result<StructuralReport, AnalysisError> {
    Analyzer::default().analyze(source)
}
