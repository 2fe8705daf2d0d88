//! Row serialization and batch inserts.

use crate::{DatabaseResult, SqlParam, Warehouse};
use chrono::{NaiveDateTime, Utc};
use lading_core::{ColumnType, Record, RecordBatch, Schema, TableHandle, WriteOptions};
use serde_json::Value as JsonValue;
use tracing::instrument;

/// Number of rows committed by one [`write_batch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{} rows", _0)]
pub struct RowsWritten(usize);

impl RowsWritten {
    /// Number of rows written.
    pub fn count(&self) -> usize {
        self.0
    }
}

/// Serialize one value for a column of the given type.
///
/// Missing and null values become typed NULLs. Booleans, integers and
/// doubles pass through when the column has that type. Everything else,
/// including numbers landing in a degraded VARCHAR column, is rendered to
/// text and cut to the write cap.
///
/// # Examples
///
/// ```
/// use lading_core::{ColumnType, WriteOptions};
/// use lading_database::{serialize_value, SqlParam};
/// use serde_json::json;
///
/// let options = WriteOptions::default();
/// assert_eq!(serialize_value(Some(&json!(7)), ColumnType::Integer, &options), SqlParam::Integer(7));
/// assert_eq!(
///     serialize_value(Some(&json!(7)), ColumnType::Varchar(200), &options),
///     SqlParam::Text("7".to_string())
/// );
/// assert_eq!(serialize_value(None, ColumnType::Boolean, &options), SqlParam::Null(ColumnType::Boolean));
/// ```
pub fn serialize_value(
    value: Option<&JsonValue>,
    column_type: ColumnType,
    options: &WriteOptions,
) -> SqlParam {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return SqlParam::Null(column_type);
    };

    let text = || SqlParam::Text(truncate_chars(render_text(value), *options.text_cap()));
    if column_type.is_textual() {
        return text();
    }

    let passthrough = match column_type {
        ColumnType::Boolean => value.as_bool().map(SqlParam::Bool),
        ColumnType::Integer => value.as_i64().map(SqlParam::Integer),
        ColumnType::Double => value.as_f64().map(SqlParam::Double),
        ColumnType::Timestamp | ColumnType::Varchar(_) => None,
    };
    passthrough.unwrap_or_else(text)
}

/// Serialize a record in schema column order, followed by the upload timestamp.
pub fn serialize_record(
    record: &Record,
    schema: &Schema,
    options: &WriteOptions,
    upload_ts: NaiveDateTime,
) -> Vec<SqlParam> {
    let mut row: Vec<SqlParam> = schema
        .columns()
        .iter()
        .map(|column| serialize_value(record.get(column.name()), *column.column_type(), options))
        .collect();
    row.push(SqlParam::Timestamp(upload_ts));
    row
}

/// Write every record of the batch into the table, stamped with the current time.
///
/// See [`write_batch_at`].
pub fn write_batch<W>(
    warehouse: &mut W,
    handle: &TableHandle,
    schema: &Schema,
    batch: &RecordBatch,
    options: &WriteOptions,
) -> DatabaseResult<RowsWritten>
where
    W: Warehouse + ?Sized,
{
    write_batch_at(warehouse, handle, schema, batch, options, Utc::now().naive_utc())
}

/// Write every record of the batch into the table with an explicit upload timestamp.
///
/// Rows are inserted in batch order, one execution per record, and committed
/// once at the end.
///
/// # Errors
///
/// `Write` from the first failing row; earlier rows are left uncommitted.
#[instrument(
    name = "batch_writer.write_batch",
    skip(warehouse, schema, batch, options),
    fields(table = %handle, rows = batch.len(), columns = schema.len())
)]
pub fn write_batch_at<W>(
    warehouse: &mut W,
    handle: &TableHandle,
    schema: &Schema,
    batch: &RecordBatch,
    options: &WriteOptions,
    upload_ts: NaiveDateTime,
) -> DatabaseResult<RowsWritten>
where
    W: Warehouse + ?Sized,
{
    if batch.is_empty() {
        tracing::debug!("Empty batch, nothing to write");
        return Ok(RowsWritten(0));
    }

    let sql = warehouse.dialect().insert_sql(handle, schema);
    tracing::debug!(sql = %sql, "Prepared INSERT");

    let rows: Vec<Vec<SqlParam>> = batch
        .iter()
        .map(|record| serialize_record(record, schema, options, upload_ts))
        .collect();

    let written = warehouse.insert_rows(handle, &sql, &rows).inspect_err(|e| {
        tracing::error!(error = %e, "Batch insert failed");
    })?;

    tracing::info!(written, "Batch committed");
    Ok(RowsWritten(written))
}

fn render_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keep at most `cap` characters.
fn truncate_chars(mut text: String, cap: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(cap) {
        text.truncate(byte_index);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lading_core::ColumnSpec;
    use serde_json::json;

    fn options() -> WriteOptions {
        WriteOptions::default()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef".to_string(), 3), "abc");
        assert_eq!(truncate_chars("abc".to_string(), 3), "abc");
        assert_eq!(truncate_chars("ééé".to_string(), 2), "éé");
        assert_eq!(truncate_chars(String::new(), 0), "");
    }

    #[test]
    fn test_typed_passthrough() {
        assert_eq!(
            serialize_value(Some(&json!(true)), ColumnType::Boolean, &options()),
            SqlParam::Bool(true)
        );
        assert_eq!(
            serialize_value(Some(&json!(2.5)), ColumnType::Double, &options()),
            SqlParam::Double(2.5)
        );
        assert_eq!(
            serialize_value(Some(&json!(-3)), ColumnType::Integer, &options()),
            SqlParam::Integer(-3)
        );
    }

    #[test]
    fn test_null_and_missing_are_typed_nulls() {
        assert_eq!(
            serialize_value(Some(&json!(null)), ColumnType::Double, &options()),
            SqlParam::Null(ColumnType::Double)
        );
        assert_eq!(
            serialize_value(None, ColumnType::Varchar(200), &options()),
            SqlParam::Null(ColumnType::Varchar(200))
        );
    }

    #[test]
    fn test_degraded_column_coerces_to_text() {
        let column = ColumnType::Varchar(200);
        assert_eq!(
            serialize_value(Some(&json!(1)), column, &options()),
            SqlParam::Text("1".to_string())
        );
        assert_eq!(
            serialize_value(Some(&json!(false)), column, &options()),
            SqlParam::Text("false".to_string())
        );
        assert_eq!(
            serialize_value(Some(&json!({"k": [1, 2]})), column, &options()),
            SqlParam::Text(r#"{"k":[1,2]}"#.to_string())
        );
    }

    #[test]
    fn test_timestamp_written_as_text() {
        assert_eq!(
            serialize_value(Some(&json!("2024-01-01T00:00:00Z")), ColumnType::Timestamp, &options()),
            SqlParam::Text("2024-01-01T00:00:00Z".to_string())
        );
        assert_eq!(
            serialize_value(Some(&json!(20240101)), ColumnType::Timestamp, &options()),
            SqlParam::Text("20240101".to_string())
        );
    }

    #[test]
    fn test_global_cap_ignores_column_capacity() {
        let long = "z".repeat(6000);
        let SqlParam::Text(small_column) =
            serialize_value(Some(&json!(long)), ColumnType::Varchar(200), &options())
        else {
            panic!("expected text");
        };
        assert_eq!(small_column.chars().count(), 5000);

        let SqlParam::Text(custom) =
            serialize_value(Some(&json!(long)), ColumnType::Varchar(5000), &WriteOptions::new(10))
        else {
            panic!("expected text");
        };
        assert_eq!(custom, "z".repeat(10));
    }

    #[test]
    fn test_serialize_record_appends_upload_ts() {
        let schema = Schema::new(vec![
            ColumnSpec::new("a", ColumnType::Integer),
            ColumnSpec::new("b", ColumnType::Varchar(200)),
            ColumnSpec::new("c", ColumnType::Boolean),
        ]);
        let record = json!({"b": "x", "a": 1}).as_object().cloned().unwrap();
        let ts = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let row = serialize_record(&record, &schema, &options(), ts);
        assert_eq!(
            row,
            vec![
                SqlParam::Integer(1),
                SqlParam::Text("x".to_string()),
                SqlParam::Null(ColumnType::Boolean),
                SqlParam::Timestamp(ts),
            ]
        );
    }
}
