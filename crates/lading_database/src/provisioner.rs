//! Idempotent table provisioning.

use crate::{DatabaseResult, Warehouse};
use lading_core::{Schema, TableHandle};
use tracing::instrument;

/// Outcome of [`ensure_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TableStatus {
    /// The table was absent and this call created it.
    #[display("created")]
    Created,
    /// The table already existed, or a concurrent creator won the race.
    #[display("existing")]
    Existing,
}

impl TableStatus {
    /// Whether this call issued the CREATE that produced the table.
    pub fn was_created(&self) -> bool {
        matches!(self, TableStatus::Created)
    }
}

/// Make sure a table matching `schema` exists.
///
/// Checks the catalog first and issues a single CREATE only when the table is
/// absent. An existing table is assumed compatible; its columns are not
/// compared with `schema`.
///
/// The check and the create are not atomic. When a concurrent request creates
/// the same table in between, the store's "already exists" failure is logged
/// and treated as success.
///
/// # Errors
///
/// Catalog lookup failures and `Provisioning` errors from the store.
#[instrument(
    name = "provisioner.ensure_table",
    skip(warehouse, schema),
    fields(table = %handle, columns = schema.len())
)]
pub fn ensure_table<W>(
    warehouse: &mut W,
    handle: &TableHandle,
    schema: &Schema,
) -> DatabaseResult<TableStatus>
where
    W: Warehouse + ?Sized,
{
    if warehouse.table_exists(handle)? {
        tracing::info!("Table already exists, skipping creation");
        return Ok(TableStatus::Existing);
    }

    let ddl = warehouse.dialect().create_table_sql(handle, schema);
    tracing::debug!(sql = %ddl, "Creating table");

    match warehouse.create_table(handle, &ddl) {
        Ok(()) => {
            tracing::info!("Table created");
            Ok(TableStatus::Created)
        }
        Err(e) if e.is_duplicate_table() => {
            tracing::warn!(error = %e, "Table was created concurrently, continuing");
            Ok(TableStatus::Existing)
        }
        Err(e) => {
            tracing::error!(error = %e, "Table creation failed");
            Err(e)
        }
    }
}
