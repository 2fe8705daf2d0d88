//! SQL rendering for the supported warehouses.

use lading_core::{ColumnType, SYSTEM_COLUMN, Schema, TableHandle};
use serde::{Deserialize, Serialize};

/// SQL flavor spoken by a warehouse.
///
/// All identifiers are upper-cased and double-quoted. Statements are built
/// from an inferred [`Schema`] and always end with the system column.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Columnar store: `CREATE COLUMN TABLE`, `NVARCHAR`, `?` placeholders
    #[default]
    #[display("hana")]
    Hana,
    /// PostgreSQL: `CREATE TABLE`, `VARCHAR`, `$n` placeholders
    #[display("postgres")]
    Postgres,
}

impl Dialect {
    /// Quote an identifier, folding it to upper case.
    ///
    /// # Examples
    ///
    /// ```
    /// use lading_database::Dialect;
    ///
    /// assert_eq!(Dialect::Hana.quote_identifier("order_id"), "\"ORDER_ID\"");
    /// assert_eq!(Dialect::Hana.quote_identifier("we\"ird"), "\"WE\"\"IRD\"");
    /// ```
    pub fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.to_uppercase().replace('"', "\"\""))
    }

    /// `"SCHEMA"."TABLE"`
    pub fn qualified_name(&self, handle: &TableHandle) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(handle.schema()),
            self.quote_identifier(handle.table())
        )
    }

    /// Column type as written in DDL.
    pub fn column_type_sql(&self, column_type: ColumnType) -> String {
        match (self, column_type) {
            (_, ColumnType::Boolean) => "BOOLEAN".to_string(),
            (_, ColumnType::Timestamp) => "TIMESTAMP".to_string(),
            (Dialect::Hana, ColumnType::Integer) => "INTEGER".to_string(),
            (Dialect::Hana, ColumnType::Double) => "DOUBLE".to_string(),
            (Dialect::Hana, ColumnType::Varchar(n)) => format!("NVARCHAR({n})"),
            (Dialect::Postgres, ColumnType::Integer) => "BIGINT".to_string(),
            (Dialect::Postgres, ColumnType::Double) => "DOUBLE PRECISION".to_string(),
            (Dialect::Postgres, ColumnType::Varchar(n)) => format!("VARCHAR({n})"),
        }
    }

    /// CREATE statement for the schema plus the trailing system column.
    ///
    /// # Examples
    ///
    /// ```
    /// use lading_core::{ColumnSpec, ColumnType, Schema, TableHandle};
    /// use lading_database::Dialect;
    ///
    /// let schema = Schema::new(vec![ColumnSpec::new("a", ColumnType::Integer)]);
    /// let handle = TableHandle::new("s", "t");
    /// assert_eq!(
    ///     Dialect::Hana.create_table_sql(&handle, &schema),
    ///     r#"CREATE COLUMN TABLE "S"."T" ("A" INTEGER, "UPLOAD_TS" TIMESTAMP)"#
    /// );
    /// ```
    pub fn create_table_sql(&self, handle: &TableHandle, schema: &Schema) -> String {
        let mut columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|column| {
                format!(
                    "{} {}",
                    self.quote_identifier(column.name()),
                    self.column_type_sql(*column.column_type())
                )
            })
            .collect();
        columns.push(format!(
            "{} TIMESTAMP",
            self.quote_identifier(SYSTEM_COLUMN)
        ));

        let keyword = match self {
            Dialect::Hana => "CREATE COLUMN TABLE",
            Dialect::Postgres => "CREATE TABLE",
        };
        format!(
            "{} {} ({})",
            keyword,
            self.qualified_name(handle),
            columns.join(", ")
        )
    }

    /// Parameterized INSERT with one placeholder per column plus the system column.
    ///
    /// On PostgreSQL, text bound into a timestamp column is cast in SQL.
    pub fn insert_sql(&self, handle: &TableHandle, schema: &Schema) -> String {
        let mut names: Vec<String> = schema
            .names()
            .map(|name| self.quote_identifier(name))
            .collect();
        names.push(self.quote_identifier(SYSTEM_COLUMN));

        let mut placeholders: Vec<String> = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| match self {
                Dialect::Hana => "?".to_string(),
                Dialect::Postgres => match column.column_type() {
                    ColumnType::Timestamp => format!("CAST(${} AS TIMESTAMP)", index + 1),
                    _ => format!("${}", index + 1),
                },
            })
            .collect();
        placeholders.push(match self {
            Dialect::Hana => "?".to_string(),
            Dialect::Postgres => format!("${}", schema.len() + 1),
        });

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified_name(handle),
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Catalog lookup taking the schema and table names as parameters.
    pub fn table_exists_sql(&self) -> &'static str {
        match self {
            Dialect::Hana => {
                "SELECT COUNT(*) AS TABLE_COUNT FROM SYS.TABLES WHERE SCHEMA_NAME = ? AND TABLE_NAME = ?"
            }
            Dialect::Postgres => {
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2) AS exists"
            }
        }
    }

    /// Connectivity check returning the single integer `1`.
    pub fn ping_sql(&self) -> &'static str {
        match self {
            Dialect::Hana => "SELECT 1 AS PING FROM DUMMY",
            Dialect::Postgres => "SELECT 1 AS ping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lading_core::ColumnSpec;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("id", ColumnType::Integer),
            ColumnSpec::new("name", ColumnType::Varchar(200)),
            ColumnSpec::new("seen_at", ColumnType::Timestamp),
            ColumnSpec::new("score", ColumnType::Double),
            ColumnSpec::new("active", ColumnType::Boolean),
        ])
    }

    #[test]
    fn test_hana_create_table() {
        let sql = Dialect::Hana.create_table_sql(&TableHandle::new("my_schema", "events"), &sample_schema());
        assert_eq!(
            sql,
            r#"CREATE COLUMN TABLE "MY_SCHEMA"."EVENTS" ("ID" INTEGER, "NAME" NVARCHAR(200), "SEEN_AT" TIMESTAMP, "SCORE" DOUBLE, "ACTIVE" BOOLEAN, "UPLOAD_TS" TIMESTAMP)"#
        );
    }

    #[test]
    fn test_postgres_create_table() {
        let sql = Dialect::Postgres.create_table_sql(&TableHandle::new("raw", "events"), &sample_schema());
        assert_eq!(
            sql,
            r#"CREATE TABLE "RAW"."EVENTS" ("ID" BIGINT, "NAME" VARCHAR(200), "SEEN_AT" TIMESTAMP, "SCORE" DOUBLE PRECISION, "ACTIVE" BOOLEAN, "UPLOAD_TS" TIMESTAMP)"#
        );
    }

    #[test]
    fn test_hana_insert() {
        let sql = Dialect::Hana.insert_sql(&TableHandle::new("s", "t"), &sample_schema());
        assert_eq!(
            sql,
            r#"INSERT INTO "S"."T" ("ID", "NAME", "SEEN_AT", "SCORE", "ACTIVE", "UPLOAD_TS") VALUES (?, ?, ?, ?, ?, ?)"#
        );
    }

    #[test]
    fn test_postgres_insert_casts_timestamp_text() {
        let sql = Dialect::Postgres.insert_sql(&TableHandle::new("s", "t"), &sample_schema());
        assert_eq!(
            sql,
            r#"INSERT INTO "S"."T" ("ID", "NAME", "SEEN_AT", "SCORE", "ACTIVE", "UPLOAD_TS") VALUES ($1, $2, CAST($3 AS TIMESTAMP), $4, $5, $6)"#
        );
    }

    #[test]
    fn test_empty_schema_still_has_system_column() {
        let schema = Schema::default();
        let handle = TableHandle::new("s", "t");
        assert_eq!(
            Dialect::Hana.create_table_sql(&handle, &schema),
            r#"CREATE COLUMN TABLE "S"."T" ("UPLOAD_TS" TIMESTAMP)"#
        );
        assert_eq!(
            Dialect::Postgres.insert_sql(&handle, &schema),
            r#"INSERT INTO "S"."T" ("UPLOAD_TS") VALUES ($1)"#
        );
    }

    #[test]
    fn test_dialect_display_and_default() {
        assert_eq!(Dialect::default(), Dialect::Hana);
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
    }
}
