//! Inferred schema types.

use crate::ColumnType;
use serde_json::{Map, Value as JsonValue};

/// Name of the write-time timestamp column appended to every table.
pub const SYSTEM_COLUMN: &str = "UPLOAD_TS";

/// One inferred column.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ColumnSpec {
    /// Key as it appears in the records
    name: String,
    /// Resolved column type
    column_type: ColumnType,
}

impl ColumnSpec {
    /// Create a column specification.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered mapping from column name to column type.
///
/// Columns appear in first-seen key order. The system column is implicit:
/// it is never stored here and is appended by DDL and DML rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Create a schema from columns already in order.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Columns in order, excluding the system column.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of inferred columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column was inferred.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Type of the named column, if present.
    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.column_type)
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Column name to rendered type, in column order.
    ///
    /// # Examples
    ///
    /// ```
    /// use lading_core::{ColumnSpec, ColumnType, Schema};
    ///
    /// let schema = Schema::new(vec![ColumnSpec::new("a", ColumnType::Integer)]);
    /// assert_eq!(schema.type_map()["a"], "INTEGER");
    /// ```
    pub fn type_map(&self) -> Map<String, JsonValue> {
        self.columns
            .iter()
            .map(|column| {
                (
                    column.name.clone(),
                    JsonValue::String(column.column_type.to_string()),
                )
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnSpec;
    type IntoIter = std::slice::Iter<'a, ColumnSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
