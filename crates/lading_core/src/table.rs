//! Target table identification.

/// Schema-qualified name of a target table.
///
/// Both parts are folded to upper case on construction, matching the
/// warehouse's identifier folding, so lookups, DDL and DML all agree.
///
/// # Examples
///
/// ```
/// use lading_core::TableHandle;
///
/// let handle = TableHandle::new("my_schema", "Orders");
/// assert_eq!(handle.schema(), "MY_SCHEMA");
/// assert_eq!(handle.table(), "ORDERS");
/// assert_eq!(handle.to_string(), "MY_SCHEMA.ORDERS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{}.{}", schema, table)]
pub struct TableHandle {
    schema: String,
    table: String,
}

impl TableHandle {
    /// Create a handle, upper-casing both parts.
    pub fn new(schema: impl AsRef<str>, table: impl AsRef<str>) -> Self {
        Self {
            schema: schema.as_ref().trim().to_uppercase(),
            table: table.as_ref().trim().to_uppercase(),
        }
    }

    /// Upper-cased schema (namespace) name.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Upper-cased table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}
