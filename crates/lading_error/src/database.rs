//! Database error types.

/// Database error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Store unreachable or misconfigured
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// Catalog lookup failed
    #[display("Catalog lookup error: {}", _0)]
    Catalog(String),
    /// CREATE statement failed for a reason other than a concurrent create
    #[display("Failed to create table '{}': {}", table, message)]
    Provisioning {
        /// Schema-qualified table name
        table: String,
        /// Message reported by the store
        message: String,
    },
    /// The store reported that the table already exists
    #[display("Table '{}' already exists", _0)]
    DuplicateTable(String),
    /// An INSERT failed; `row` is the zero-based position in the batch
    #[display("Failed to insert row {}: {}", row, message)]
    Write {
        /// Zero-based index of the first failing record
        row: usize,
        /// Message reported by the store
        message: String,
    },
    /// Any other statement failed
    #[display("Database query error: {}", _0)]
    Query(String),
}

/// Database error with source location tracking.
///
/// # Examples
///
/// ```
/// use lading_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::DuplicateTable("\"S\".\"T\"".into()));
/// assert!(format!("{}", err).contains("already exists"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error is the benign "table already exists" outcome of a create race.
    pub fn is_duplicate_table(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::DuplicateTable(_))
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        DatabaseError::new(DatabaseErrorKind::Query(err.to_string()))
    }
}

impl From<diesel::ConnectionError> for DatabaseError {
    fn from(err: diesel::ConnectionError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}
