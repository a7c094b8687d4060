use std::fmt;

/// Why an input was rejected before analysis. Malformed VBA is never an error;
/// it shows up as diagnostics in the report instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The source was empty or contained only whitespace.
    EmptyInput,
    /// The source exceeded the configured size bound.
    InputTooLarge { size: usize, limit: usize },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyInput => write!(f, "Input is empty"),
            AnalysisError::InputTooLarge { size, limit } => {
                write!(f, "Input is {} bytes, larger than the {} byte limit", size, limit)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
