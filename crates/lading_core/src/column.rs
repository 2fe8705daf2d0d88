//! Column type tags.

/// Classification of a single non-null JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TypeTag {
    /// JSON `true` / `false`
    #[display("BOOLEAN")]
    Boolean,
    /// Integral JSON number within the signed 64-bit range
    #[display("INTEGER")]
    Integer,
    /// Any other JSON number
    #[display("DOUBLE")]
    Double,
    /// String that parses as an ISO-8601 date-time
    #[display("TIMESTAMP")]
    Timestamp,
    /// Everything else, rendered as text
    #[display("VARCHAR")]
    Varchar,
}

/// Final type of one column.
///
/// # Examples
///
/// ```
/// use lading_core::ColumnType;
///
/// assert_eq!(ColumnType::Varchar(210).to_string(), "VARCHAR(210)");
/// assert_eq!(ColumnType::Integer.to_string(), "INTEGER");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ColumnType {
    /// Boolean column
    #[display("BOOLEAN")]
    Boolean,
    /// Integer column
    #[display("INTEGER")]
    Integer,
    /// Double precision column
    #[display("DOUBLE")]
    Double,
    /// Timestamp column
    #[display("TIMESTAMP")]
    Timestamp,
    /// Variable-length text column with its character capacity
    #[display("VARCHAR({})", _0)]
    Varchar(u32),
}

impl ColumnType {
    /// Whether values of this column are written as text.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::Varchar(_))
    }
}
