//! Diesel-backed PostgreSQL warehouse.

use crate::{DatabaseResult, Dialect, SqlParam, Warehouse, establish_connection};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::query_builder::BoxedSqlQuery;
use diesel::query_builder::SqlQuery;
use diesel::result::{DatabaseErrorKind as DieselErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Bool, Double, Nullable, Text, Timestamp};
use lading_core::{ColumnType, TableHandle};
use lading_error::{DatabaseError, DatabaseErrorKind};
use tracing::instrument;

#[derive(QueryableByName)]
struct PingResult {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    ping: i32,
}

#[derive(QueryableByName)]
struct TableExistsResult {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    exists: bool,
}

/// A warehouse living in a PostgreSQL database.
///
/// Statements are rendered with [`Dialect::Postgres`]. Identifiers are quoted
/// and upper-cased, so catalog lookups use the upper-cased names as stored.
pub struct PgWarehouse {
    conn: PgConnection,
}

impl std::fmt::Debug for PgWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgWarehouse").finish_non_exhaustive()
    }
}

impl PgWarehouse {
    /// Wrap an open connection.
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Connect using `database_url`, or `DATABASE_URL` when `None`.
    pub fn establish(database_url: Option<&str>) -> DatabaseResult<Self> {
        establish_connection(database_url).map(Self::new)
    }
}

fn bind_param<'f>(
    query: BoxedSqlQuery<'f, Pg, SqlQuery>,
    param: &SqlParam,
) -> BoxedSqlQuery<'f, Pg, SqlQuery> {
    match param {
        SqlParam::Null(column_type) if column_type.is_textual() => {
            query.bind::<Nullable<Text>, _>(None::<String>)
        }
        SqlParam::Null(ColumnType::Boolean) => query.bind::<Nullable<Bool>, _>(None::<bool>),
        SqlParam::Null(ColumnType::Integer) => query.bind::<Nullable<BigInt>, _>(None::<i64>),
        SqlParam::Null(_) => query.bind::<Nullable<Double>, _>(None::<f64>),
        SqlParam::Bool(value) => query.bind::<Bool, _>(*value),
        SqlParam::Integer(value) => query.bind::<BigInt, _>(*value),
        SqlParam::Double(value) => query.bind::<Double, _>(*value),
        SqlParam::Text(value) => query.bind::<Text, _>(value.clone()),
        SqlParam::Timestamp(value) => query.bind::<Timestamp, _>(*value),
    }
}

fn is_duplicate_table(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DieselErrorKind::UniqueViolation, _) => true,
        DieselError::DatabaseError(_, info) => info.message().contains("already exists"),
        _ => false,
    }
}

impl Warehouse for PgWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    #[instrument(name = "postgres.ping", skip(self))]
    fn ping(&mut self) -> DatabaseResult<i32> {
        let result: PingResult = diesel::sql_query(Dialect::Postgres.ping_sql())
            .get_result(&mut self.conn)
            .map_err(|e| {
                DatabaseError::new(DatabaseErrorKind::Connection(format!(
                    "Connectivity check failed: {}",
                    e
                )))
            })?;
        Ok(result.ping)
    }

    #[instrument(name = "postgres.table_exists", skip(self), fields(table = %handle))]
    fn table_exists(&mut self, handle: &TableHandle) -> DatabaseResult<bool> {
        let result: TableExistsResult = diesel::sql_query(Dialect::Postgres.table_exists_sql())
            .bind::<Text, _>(handle.schema())
            .bind::<Text, _>(handle.table())
            .get_result(&mut self.conn)
            .map_err(|e| {
                DatabaseError::new(DatabaseErrorKind::Catalog(format!(
                    "Failed to check table existence: {}",
                    e
                )))
            })?;

        Ok(result.exists)
    }

    #[instrument(name = "postgres.create_table", skip(self, ddl), fields(table = %handle))]
    fn create_table(&mut self, handle: &TableHandle, ddl: &str) -> DatabaseResult<()> {
        diesel::sql_query(ddl)
            .execute(&mut self.conn)
            .map_err(|e| {
                if is_duplicate_table(&e) {
                    DatabaseError::new(DatabaseErrorKind::DuplicateTable(handle.to_string()))
                } else {
                    DatabaseError::new(DatabaseErrorKind::Provisioning {
                        table: handle.to_string(),
                        message: e.to_string(),
                    })
                }
            })?;
        Ok(())
    }

    #[instrument(name = "postgres.insert_rows", skip(self, sql, rows), fields(table = %handle, rows = rows.len()))]
    fn insert_rows(
        &mut self,
        handle: &TableHandle,
        sql: &str,
        rows: &[Vec<SqlParam>],
    ) -> DatabaseResult<usize> {
        self.conn.transaction::<usize, DatabaseError, _>(|conn| {
            for (index, row) in rows.iter().enumerate() {
                let query = row
                    .iter()
                    .fold(diesel::sql_query(sql).into_boxed::<Pg>(), bind_param);
                query.execute(conn).map_err(|e| {
                    DatabaseError::new(DatabaseErrorKind::Write {
                        row: index,
                        message: e.to_string(),
                    })
                })?;
            }
            Ok(rows.len())
        })
    }
}
