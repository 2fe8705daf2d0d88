//! Schema inference error types.

/// Schema inference error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum InferenceErrorKind {
    /// Inference was asked to run over zero records
    #[display("Cannot infer a schema from an empty batch")]
    EmptyBatch,
    /// Two record keys fold to the same upper-case column name
    #[display("Keys '{}' and '{}' both map to column {}", first, second, column)]
    ColumnCollision {
        /// Key seen first
        first: String,
        /// Key seen later
        second: String,
        /// Upper-cased column name they share
        column: String,
    },
}

/// Schema inference error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Inference Error: {} at line {} in {}", kind, line, file)]
pub struct InferenceError {
    /// The kind of error that occurred
    pub kind: InferenceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl InferenceError {
    /// Create a new InferenceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: InferenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
