//! The seam between the ingestion core and a concrete store.

use crate::{DatabaseResult, Dialect};
use chrono::NaiveDateTime;
use lading_core::{ColumnType, TableHandle};

/// One bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// NULL, typed by the column it is bound to
    Null(ColumnType),
    /// Boolean value
    Bool(bool),
    /// 64-bit integer value
    Integer(i64),
    /// Double precision value
    Double(f64),
    /// Text value, already truncated to the write cap
    Text(String),
    /// Timestamp value
    Timestamp(NaiveDateTime),
}

/// A live connection to a warehouse.
///
/// One value is acquired per ingestion request and dropped when the request
/// finishes; implementations are not shared between requests.
pub trait Warehouse {
    /// SQL flavor used to render statements for this warehouse.
    fn dialect(&self) -> Dialect;

    /// Run the dialect's connectivity check.
    fn ping(&mut self) -> DatabaseResult<i32>;

    /// Look the table up in the catalog by its upper-cased schema-qualified name.
    fn table_exists(&mut self, handle: &TableHandle) -> DatabaseResult<bool>;

    /// Execute a CREATE statement.
    ///
    /// # Errors
    ///
    /// `DuplicateTable` when the store reports the table already exists,
    /// `Provisioning` for any other DDL failure.
    fn create_table(&mut self, handle: &TableHandle, ddl: &str) -> DatabaseResult<()>;

    /// Execute `sql` once per row inside one transaction and commit once.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// `Write` carrying the index of the first failing row. Nothing is
    /// committed in that case.
    fn insert_rows(
        &mut self,
        handle: &TableHandle,
        sql: &str,
        rows: &[Vec<SqlParam>],
    ) -> DatabaseResult<usize>;
}

/// Source of fresh warehouse connections.
pub trait WarehouseConnector: Send + Sync {
    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// `Connection` when the store is unreachable or misconfigured.
    fn connect(&self) -> DatabaseResult<Box<dyn Warehouse + Send>>;
}
