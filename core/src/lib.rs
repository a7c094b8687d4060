pub mod analyzer;
pub mod config;
pub mod decl;
pub mod diag;
pub mod error;
pub mod report;
pub mod scan;
pub mod token;
pub mod util;

pub use analyzer::{Analyzer, analyze};
pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use report::{ReportFormat, StructuralReport};
