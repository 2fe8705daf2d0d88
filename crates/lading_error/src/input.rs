//! Client-input error types.

/// Ways a remote response can fail to be a usable record batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum InputErrorKind {
    /// The response held no records at all
    #[display("Remote response contained no records")]
    EmptyResponse,
    /// An array element was not a JSON object
    #[display("Record {} is not a JSON object", index)]
    NotAnObject {
        /// Position of the offending element
        index: usize,
    },
    /// The response was neither an object nor an array
    #[display("Invalid API response structure: expected object or array, got {}", _0)]
    UnexpectedShape(String),
    /// The remote endpoint is not an absolute http(s) URL
    #[display("Invalid endpoint URL '{}'", _0)]
    InvalidEndpoint(String),
    /// The target table name is empty
    #[display("Target table name must not be empty")]
    EmptyTableName,
}

/// Client-input error with source location tracking.
///
/// # Examples
///
/// ```
/// use lading_error::{InputError, InputErrorKind};
///
/// let err = InputError::new(InputErrorKind::NotAnObject { index: 2 });
/// assert!(format!("{}", err).contains("Record 2"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Input Error: {} at line {} in {}", kind, line, file)]
pub struct InputError {
    /// The kind of error that occurred
    pub kind: InputErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl InputError {
    /// Create a new InputError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: InputErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
