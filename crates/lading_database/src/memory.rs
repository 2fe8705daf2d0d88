//! In-process warehouse for tests and dry runs.

use crate::{DatabaseResult, Dialect, SqlParam, Warehouse, WarehouseConnector};
use lading_core::TableHandle;
use lading_error::{DatabaseError, DatabaseErrorKind};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A table held by [`MemoryWarehouse`].
#[derive(Debug, Clone, PartialEq, Default, derive_getters::Getters)]
pub struct MemoryTable {
    /// DDL the table was created with
    ddl: String,
    /// Committed rows, each in column order with the upload timestamp last
    rows: Vec<Vec<SqlParam>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<TableHandle, MemoryTable>,
    statements: Vec<String>,
    fail_insert_at: Option<usize>,
    duplicate_on_create: bool,
    unreachable: bool,
}

/// A warehouse kept in process memory.
///
/// Clones share state, so a clone handed to a connector observes every write.
/// Statements are recorded as they are issued and inserts are committed all at
/// once, mirroring a transactional store.
///
/// # Examples
///
/// ```
/// use lading_core::{ColumnSpec, ColumnType, Schema, TableHandle};
/// use lading_database::{ensure_table, MemoryWarehouse, TableStatus};
///
/// let mut warehouse = MemoryWarehouse::default();
/// let handle = TableHandle::new("s", "t");
/// let schema = Schema::new(vec![ColumnSpec::new("a", ColumnType::Integer)]);
///
/// assert_eq!(ensure_table(&mut warehouse, &handle, &schema).unwrap(), TableStatus::Created);
/// assert_eq!(ensure_table(&mut warehouse, &handle, &schema).unwrap(), TableStatus::Existing);
/// assert_eq!(warehouse.create_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    dialect: Dialect,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWarehouse {
    /// Empty warehouse rendering statements in `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Names of all tables, in sorted order.
    pub fn tables(&self) -> Vec<TableHandle> {
        self.state().tables.keys().cloned().collect()
    }

    /// Snapshot of a table.
    pub fn table(&self, handle: &TableHandle) -> Option<MemoryTable> {
        self.state().tables.get(handle).cloned()
    }

    /// Committed rows of a table; empty if it does not exist.
    pub fn rows(&self, handle: &TableHandle) -> Vec<Vec<SqlParam>> {
        self.table(handle)
            .map(|table| table.rows().clone())
            .unwrap_or_default()
    }

    /// DDL a table was created with.
    pub fn ddl(&self, handle: &TableHandle) -> Option<String> {
        self.table(handle).map(|table| table.ddl().clone())
    }

    /// Every statement issued so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    /// Number of CREATE statements issued.
    pub fn create_count(&self) -> usize {
        self.state()
            .statements
            .iter()
            .filter(|statement| statement.starts_with("CREATE"))
            .count()
    }

    /// Make the insert of the row at `row` fail.
    pub fn fail_insert_at(&self, row: usize) {
        self.state().fail_insert_at = Some(row);
    }

    /// Make the next CREATE lose a race: the table appears, but the
    /// statement reports that it already exists.
    pub fn simulate_concurrent_create(&self) {
        self.state().duplicate_on_create = true;
    }

    /// Make [`WarehouseConnector::connect`] and [`Warehouse::ping`] fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }
}

impl Warehouse for MemoryWarehouse {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn ping(&mut self) -> DatabaseResult<i32> {
        let mut state = self.state();
        if state.unreachable {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "warehouse unreachable".to_string(),
            )));
        }
        state.statements.push(self.dialect.ping_sql().to_string());
        Ok(1)
    }

    fn table_exists(&mut self, handle: &TableHandle) -> DatabaseResult<bool> {
        let mut state = self.state();
        state
            .statements
            .push(self.dialect.table_exists_sql().to_string());
        Ok(state.tables.contains_key(handle))
    }

    fn create_table(&mut self, handle: &TableHandle, ddl: &str) -> DatabaseResult<()> {
        let mut state = self.state();
        state.statements.push(ddl.to_string());

        if std::mem::take(&mut state.duplicate_on_create) {
            state.tables.entry(handle.clone()).or_insert_with(|| MemoryTable {
                ddl: ddl.to_string(),
                rows: Vec::new(),
            });
            return Err(DatabaseError::new(DatabaseErrorKind::DuplicateTable(
                handle.to_string(),
            )));
        }

        if state.tables.contains_key(handle) {
            return Err(DatabaseError::new(DatabaseErrorKind::DuplicateTable(
                handle.to_string(),
            )));
        }

        state.tables.insert(
            handle.clone(),
            MemoryTable {
                ddl: ddl.to_string(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn insert_rows(
        &mut self,
        handle: &TableHandle,
        sql: &str,
        rows: &[Vec<SqlParam>],
    ) -> DatabaseResult<usize> {
        let mut state = self.state();
        if !state.tables.contains_key(handle) {
            return Err(DatabaseError::new(DatabaseErrorKind::Write {
                row: 0,
                message: format!("table {} does not exist", handle),
            }));
        }

        let mut staged = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            state.statements.push(sql.to_string());
            if state.fail_insert_at == Some(index) {
                state.statements.push("ROLLBACK".to_string());
                return Err(DatabaseError::new(DatabaseErrorKind::Write {
                    row: index,
                    message: "injected failure".to_string(),
                }));
            }
            staged.push(row.clone());
        }

        state.statements.push("COMMIT".to_string());
        if let Some(table) = state.tables.get_mut(handle) {
            table.rows.extend(staged);
        }
        Ok(rows.len())
    }
}

impl WarehouseConnector for MemoryWarehouse {
    fn connect(&self) -> DatabaseResult<Box<dyn Warehouse + Send>> {
        if self.state().unreachable {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "warehouse unreachable".to_string(),
            )));
        }
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let warehouse = MemoryWarehouse::default();
        let mut clone = warehouse.clone();
        let handle = TableHandle::new("s", "t");
        clone.create_table(&handle, "CREATE COLUMN TABLE x").unwrap();
        assert_eq!(warehouse.tables(), vec![handle.clone()]);
        assert_eq!(warehouse.ddl(&handle).as_deref(), Some("CREATE COLUMN TABLE x"));
    }

    #[test]
    fn test_second_create_reports_duplicate() {
        let mut warehouse = MemoryWarehouse::default();
        let handle = TableHandle::new("s", "t");
        warehouse.create_table(&handle, "CREATE").unwrap();
        let err = warehouse.create_table(&handle, "CREATE").unwrap_err();
        assert!(err.is_duplicate_table());
    }

    #[test]
    fn test_unreachable_connector() {
        let warehouse = MemoryWarehouse::new(Dialect::Postgres);
        warehouse.set_unreachable(true);
        let err = warehouse.connect().err().unwrap();
        assert!(matches!(err.kind, DatabaseErrorKind::Connection(_)));
    }

    #[test]
    fn test_insert_into_missing_table() {
        let mut warehouse = MemoryWarehouse::default();
        let err = warehouse
            .insert_rows(&TableHandle::new("s", "t"), "INSERT", &[vec![]])
            .unwrap_err();
        assert!(matches!(err.kind, DatabaseErrorKind::Write { row: 0, .. }));
    }
}
