//! Error types for the lading ingestion bridge.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use lading_error::{FetchError, LadingResult};
//!
//! fn fetch_records() -> LadingResult<String> {
//!     Err(FetchError::new("Connection refused"))?
//! }
//!
//! assert!(fetch_records().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod backend;
mod config;
#[cfg(feature = "database")]
mod database;
mod error;
mod fetch;
mod inference;
mod input;

pub use auth::{AuthError, AuthErrorKind};
pub use backend::BackendError;
pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{LadingError, LadingErrorKind, LadingResult};
pub use fetch::FetchError;
pub use inference::{InferenceError, InferenceErrorKind};
pub use input::{InputError, InputErrorKind};
