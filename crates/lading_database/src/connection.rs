//! Database connection utilities.

use crate::{DatabaseResult, Dialect, HanaConnector, PgWarehouse, Warehouse, WarehouseConnector};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use lading_error::{DatabaseError, DatabaseErrorKind};
use std::sync::Arc;

/// Use `database_url` when given, otherwise the `DATABASE_URL` environment variable.
pub(crate) fn resolve_database_url(database_url: Option<&str>) -> DatabaseResult<String> {
    match database_url {
        Some(url) => Ok(url.to_string()),
        None => std::env::var("DATABASE_URL").map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Connection(
                "DATABASE_URL environment variable not set".to_string(),
            ))
        }),
    }
}

/// Establish a connection to the PostgreSQL database.
///
/// Uses `database_url` when given, otherwise the `DATABASE_URL` environment
/// variable.
///
/// # Errors
///
/// Returns an error if:
/// - No URL was given and `DATABASE_URL` is not set
/// - Connection to the database fails
pub fn establish_connection(database_url: Option<&str>) -> DatabaseResult<PgConnection> {
    let database_url = resolve_database_url(database_url)?;
    Ok(PgConnection::establish(&database_url)?)
}

/// Opens one [`PgWarehouse`] per request.
#[derive(Debug, Clone, Default)]
pub struct PgConnector {
    database_url: Option<String>,
}

impl PgConnector {
    /// Connector for an explicit URL, or `DATABASE_URL` when `None`.
    pub fn new(database_url: Option<String>) -> Self {
        Self { database_url }
    }
}

impl WarehouseConnector for PgConnector {
    fn connect(&self) -> DatabaseResult<Box<dyn Warehouse + Send>> {
        let conn = establish_connection(self.database_url.as_deref())?;
        tracing::debug!("Opened warehouse connection");
        Ok(Box::new(PgWarehouse::new(conn)))
    }
}

/// Connector for the store speaking `dialect`.
///
/// # Examples
///
/// ```
/// use lading_database::{Dialect, connector_for};
///
/// let connector = connector_for(Dialect::Hana, Some("not a url".to_string()));
/// assert!(connector.connect().is_err());
/// ```
pub fn connector_for(
    dialect: Dialect,
    database_url: Option<String>,
) -> Arc<dyn WarehouseConnector> {
    tracing::info!(%dialect, "Selected warehouse backend");
    match dialect {
        Dialect::Hana => Arc::new(HanaConnector::new(database_url)),
        Dialect::Postgres => Arc::new(PgConnector::new(database_url)),
    }
}
