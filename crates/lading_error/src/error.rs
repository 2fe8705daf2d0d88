//! Top-level error wrapper types.

use crate::{
    AuthError, BackendError, ConfigError, FetchError, InferenceError, InputError,
};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// Every failure an ingestion request can surface.
///
/// # Examples
///
/// ```
/// use lading_error::{FetchError, LadingError};
///
/// let err: LadingError = FetchError::new("Connection failed").into();
/// assert!(format!("{}", err).contains("Fetch Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum LadingErrorKind {
    /// Malformed or empty remote response
    #[from(InputError)]
    Input(InputError),
    /// Inference over an unusable batch
    #[from(InferenceError)]
    Inference(InferenceError),
    /// Store connection, provisioning or write failure
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Remote fetch failure
    #[from(FetchError)]
    Fetch(FetchError),
    /// Basic-auth rejection
    #[from(AuthError)]
    Auth(AuthError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Background task failure
    #[from(BackendError)]
    Backend(BackendError),
}

/// Lading error with kind discrimination.
///
/// # Examples
///
/// ```
/// use lading_error::{ConfigError, LadingResult};
///
/// fn might_fail() -> LadingResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Lading Error: {}", _0)]
pub struct LadingError(Box<LadingErrorKind>);

impl LadingError {
    /// Create a new error from a kind.
    pub fn new(kind: LadingErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LadingErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to LadingErrorKind
impl<T> From<T> for LadingError
where
    T: Into<LadingErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for lading operations.
pub type LadingResult<T> = std::result::Result<T, LadingError>;
