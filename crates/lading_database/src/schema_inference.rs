//! Schema inference from JSON record batches.
//!
//! Every key observed anywhere in the batch becomes one column. Each non-null
//! value is classified into a [`TypeTag`]; a column that saw exactly one tag
//! keeps it, a column that saw several degrades to VARCHAR. VARCHAR columns are
//! sized from the longest rendered value using [`VarcharSizing`].

use chrono::{DateTime, NaiveDateTime};
use lading_core::{ColumnSpec, ColumnType, Record, RecordBatch, Schema, TypeTag, VarcharSizing};
use lading_error::{InferenceError, InferenceErrorKind};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use tracing::instrument;

/// Date-time layouts carrying an explicit UTC offset.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Date-time layouts without an offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// What has been seen for one key across the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnObservation {
    /// Distinct tags of the non-null values
    pub tags: BTreeSet<TypeTag>,
    /// Longest rendered value, in characters
    pub max_len: usize,
    /// Number of non-null values
    pub non_null: usize,
}

impl ColumnObservation {
    /// Record one value. Nulls contribute nothing.
    pub fn observe(&mut self, value: &JsonValue) {
        let Some(tag) = classify_value(value) else {
            return;
        };
        self.tags.insert(tag);
        self.max_len = self.max_len.max(rendered_len(value));
        self.non_null += 1;
    }

    /// Collapse the observed tags into the column's final type.
    pub fn resolve(&self, sizing: &VarcharSizing) -> ColumnType {
        let mut tags = self.tags.iter();
        match (tags.next(), tags.next()) {
            (Some(TypeTag::Boolean), None) => ColumnType::Boolean,
            (Some(TypeTag::Integer), None) => ColumnType::Integer,
            (Some(TypeTag::Double), None) => ColumnType::Double,
            (Some(TypeTag::Timestamp), None) => ColumnType::Timestamp,
            // Text-only, all-null and mixed columns all end up here.
            _ => ColumnType::Varchar(sizing.capacity_for(self.max_len)),
        }
    }
}

/// Running schema built one record at a time.
#[derive(Debug, Clone, Default)]
pub struct InferredSchema {
    order: Vec<String>,
    fields: HashMap<String, ColumnObservation>,
}

impl InferredSchema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one field value, registering the key on first sight.
    pub fn add_field(&mut self, name: &str, value: &JsonValue) {
        if let Some(existing) = self.fields.get_mut(name) {
            existing.observe(value);
            return;
        }

        tracing::trace!(field = name, "Adding new field");
        let mut observation = ColumnObservation::default();
        observation.observe(value);
        self.order.push(name.to_string());
        self.fields.insert(name.to_string(), observation);
    }

    /// Add every field of a record. Keys the record lacks are left untouched.
    pub fn add_record(&mut self, record: &Record) {
        for (key, value) in record {
            self.add_field(key, value);
        }
    }

    /// Get the number of fields in the schema
    pub fn field_count(&self) -> usize {
        self.order.len()
    }

    /// Observation for a field, if it was seen.
    pub fn observation(&self, name: &str) -> Option<&ColumnObservation> {
        self.fields.get(name)
    }

    /// Resolve every field into a [`Schema`] in first-seen order.
    pub fn finish(self, sizing: &VarcharSizing) -> Schema {
        let columns = self
            .order
            .iter()
            .filter_map(|name| {
                let observation = self.observation(name)?;
                let column_type = observation.resolve(sizing);
                if observation.tags.len() > 1 {
                    tracing::warn!(
                        field = %name,
                        observed = ?observation.tags,
                        resolved = %column_type,
                        "Mixed value types degraded to text"
                    );
                }
                Some(ColumnSpec::new(name.clone(), column_type))
            })
            .collect();
        Schema::new(columns)
    }
}

/// Classify one JSON value.
///
/// Returns `None` for null. Booleans are never treated as integers, strings
/// are TIMESTAMP only when [`is_iso_datetime`] accepts them, and integers
/// outside the signed 64-bit range fall back to VARCHAR.
///
/// # Examples
///
/// ```
/// use lading_core::TypeTag;
/// use lading_database::classify_value;
/// use serde_json::json;
///
/// assert_eq!(classify_value(&json!(true)), Some(TypeTag::Boolean));
/// assert_eq!(classify_value(&json!("2024-01-01T00:00:00Z")), Some(TypeTag::Timestamp));
/// assert_eq!(classify_value(&json!({"nested": 1})), Some(TypeTag::Varchar));
/// assert_eq!(classify_value(&json!(null)), None);
/// ```
pub fn classify_value(value: &JsonValue) -> Option<TypeTag> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some(TypeTag::Boolean),
        JsonValue::Number(n) => {
            if n.is_i64() {
                Some(TypeTag::Integer)
            } else if n.is_f64() {
                Some(TypeTag::Double)
            } else {
                Some(TypeTag::Varchar)
            }
        }
        JsonValue::String(s) => {
            if is_iso_datetime(s) {
                Some(TypeTag::Timestamp)
            } else {
                Some(TypeTag::Varchar)
            }
        }
        JsonValue::Array(_) | JsonValue::Object(_) => Some(TypeTag::Varchar),
    }
}

/// Whether a string is an ISO-8601 date-time.
///
/// Accepted grammar: `YYYY-MM-DD` and `HH:MM:SS` joined by `T` or a space,
/// an optional fractional second, and an optional `Z` or `±HH:MM` offset.
/// A trailing `Z` means UTC. Date-only and time-only strings are rejected.
///
/// Boundary behavior:
/// - Seconds run `00` to `59`; a leap second (`:60`) is rejected.
/// - The offset colon is optional, so `+0530` reads like `+05:30`.
/// - The fraction may carry any number of digits; digits past nanoseconds
///   are ignored.
///
/// # Examples
///
/// ```
/// use lading_database::is_iso_datetime;
///
/// assert!(is_iso_datetime("2024-01-01T00:00:00Z"));
/// assert!(is_iso_datetime("2024-01-01 12:30:45.123456+02:00"));
/// assert!(!is_iso_datetime("2024-01-01"));
/// assert!(!is_iso_datetime("yesterday"));
/// ```
pub fn is_iso_datetime(value: &str) -> bool {
    if !has_datetime_shape(value) {
        return false;
    }

    let normalized = match value.strip_suffix('Z') {
        Some(rest) => Cow::Owned(format!("{rest}+00:00")),
        None => Cow::Borrowed(value),
    };

    OFFSET_FORMATS
        .iter()
        .any(|format| DateTime::parse_from_str(&normalized, format).is_ok())
        || NAIVE_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(&normalized, format).is_ok())
}

/// Zero-padded `YYYY-MM-DD?HH:MM:SS` prefix check; chrono alone accepts
/// unpadded fields and leap seconds.
fn has_datetime_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 19 {
        return false;
    }
    let digits = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18];
    digits.iter().all(|&i| bytes[i].is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && matches!(bytes[10], b'T' | b' ')
        && bytes[13] == b':'
        && bytes[16] == b':'
        && bytes[17] <= b'5'
}

/// Length of a value's textual rendering, in characters.
pub fn rendered_len(value: &JsonValue) -> usize {
    match value {
        JsonValue::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

/// Reject schemas whose keys collide once folded to upper case.
fn check_column_names(schema: &Schema) -> Result<(), InferenceError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for name in schema.names() {
        let column = name.to_uppercase();
        if let Some(first) = seen.get(&column) {
            tracing::error!(first = %first, second = %name, %column, "Column name collision");
            return Err(InferenceError::new(InferenceErrorKind::ColumnCollision {
                first: first.to_string(),
                second: name.to_string(),
                column,
            }));
        }
        seen.insert(column, name);
    }
    Ok(())
}

/// Infer one column type per distinct key across the batch.
///
/// # Errors
///
/// - [`InferenceErrorKind::EmptyBatch`] when the batch has no records
/// - [`InferenceErrorKind::ColumnCollision`] when two keys differ only by case,
///   since column names are upper-cased in the store
#[instrument(name = "schema_inference.infer_schema", skip_all, fields(records = batch.len()))]
pub fn infer_schema(batch: &RecordBatch, sizing: &VarcharSizing) -> Result<Schema, InferenceError> {
    if batch.is_empty() {
        tracing::error!("Cannot infer schema from empty batch");
        return Err(InferenceError::new(InferenceErrorKind::EmptyBatch));
    }

    let mut inferred = InferredSchema::new();
    for (index, record) in batch.iter().enumerate() {
        tracing::trace!(index, field_count = record.len(), "Processing record fields");
        inferred.add_record(record);
    }

    tracing::debug!(field_count = inferred.field_count(), "Resolving column types");
    let schema = inferred.finish(sizing);
    check_column_names(&schema)?;
    tracing::info!(field_count = schema.len(), "Schema inference complete");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn infer(value: JsonValue) -> Schema {
        let batch = RecordBatch::from_json(value).unwrap();
        infer_schema(&batch, &VarcharSizing::default()).unwrap()
    }

    #[test]
    fn test_classify_boolean_not_integer() {
        assert_eq!(classify_value(&json!(false)), Some(TypeTag::Boolean));
        assert_eq!(classify_value(&json!(0)), Some(TypeTag::Integer));
    }

    #[test]
    fn test_classify_numbers() {
        assert_eq!(classify_value(&json!(42)), Some(TypeTag::Integer));
        assert_eq!(classify_value(&json!(-7)), Some(TypeTag::Integer));
        assert_eq!(classify_value(&json!(3.15)), Some(TypeTag::Double));
        assert_eq!(classify_value(&json!(u64::MAX)), Some(TypeTag::Varchar));
    }

    #[test]
    fn test_classify_strings() {
        assert_eq!(classify_value(&json!("hello")), Some(TypeTag::Varchar));
        assert_eq!(classify_value(&json!("")), Some(TypeTag::Varchar));
        assert_eq!(
            classify_value(&json!("2024-01-01T00:00:00Z")),
            Some(TypeTag::Timestamp)
        );
    }

    #[test]
    fn test_classify_nested_as_varchar() {
        assert_eq!(classify_value(&json!([1, 2, 3])), Some(TypeTag::Varchar));
        assert_eq!(classify_value(&json!({"k": "v"})), Some(TypeTag::Varchar));
    }

    #[test]
    fn test_iso_datetime_accepts() {
        assert!(is_iso_datetime("2024-01-01T00:00:00Z"));
        assert!(is_iso_datetime("2024-01-01T00:00:00"));
        assert!(is_iso_datetime("2024-01-01T00:00:00.123456"));
        assert!(is_iso_datetime("2024-01-01T23:59:59+05:30"));
        assert!(is_iso_datetime("2024-01-01T23:59:59.5-08:00"));
        assert!(is_iso_datetime("2024-01-01 08:15:00"));
    }

    #[test]
    fn test_iso_datetime_rejects() {
        assert!(!is_iso_datetime("2024-01-01"));
        assert!(!is_iso_datetime("12:00:00"));
        assert!(!is_iso_datetime("2024-1-1T00:00:00"));
        assert!(!is_iso_datetime("2024-13-01T00:00:00"));
        assert!(!is_iso_datetime("2024-01-01T25:00:00"));
        assert!(!is_iso_datetime("2024-01-01T00:00:00ZZ"));
        assert!(!is_iso_datetime("2024-01-01T00:00:00 trailing"));
        assert!(!is_iso_datetime("not a date at all!!"));
    }

    #[test]
    fn test_iso_datetime_boundaries() {
        assert!(!is_iso_datetime("2024-01-01T23:59:60"));
        assert!(!is_iso_datetime("2024-06-30T23:59:60Z"));
        assert!(is_iso_datetime("2024-01-01T23:59:59"));
        assert!(is_iso_datetime("2024-01-01T10:00:00+0530"));
        assert!(is_iso_datetime("2024-01-01T10:00:00.123456789012"));
    }

    #[test]
    fn test_single_type_columns() {
        let schema = infer(json!([
            {"flag": true, "count": 1, "ratio": 0.5, "at": "2024-01-01T00:00:00Z"},
            {"flag": false, "count": 2, "ratio": 1.5, "at": "2024-02-01T10:00:00Z"}
        ]));
        assert_eq!(schema.get("flag"), Some(ColumnType::Boolean));
        assert_eq!(schema.get("count"), Some(ColumnType::Integer));
        assert_eq!(schema.get("ratio"), Some(ColumnType::Double));
        assert_eq!(schema.get("at"), Some(ColumnType::Timestamp));
    }

    #[test]
    fn test_integer_and_string_degrade_to_varchar() {
        let schema = infer(json!([{"v": 1}, {"v": "one"}]));
        assert_eq!(schema.get("v"), Some(ColumnType::Varchar(200)));
    }

    #[test]
    fn test_integer_and_timestamp_degrade_to_varchar() {
        let schema = infer(json!([{"v": 1}, {"v": "2024-01-01T00:00:00Z"}]));
        assert_eq!(schema.get("v"), Some(ColumnType::Varchar(200)));
    }

    #[test]
    fn test_integer_and_double_degrade_to_varchar() {
        let schema = infer(json!([{"v": 1}, {"v": 2.5}]));
        assert_eq!(schema.get("v"), Some(ColumnType::Varchar(200)));
    }

    #[test]
    fn test_boolean_and_integer_degrade_to_varchar() {
        let schema = infer(json!([{"v": true}, {"v": 1}]));
        assert_eq!(schema.get("v"), Some(ColumnType::Varchar(200)));
    }

    #[test]
    fn test_varchar_sizing_from_longest_value() {
        let long = "x".repeat(300);
        let schema = infer(json!([{"s": "a"}, {"s": long}]));
        assert_eq!(schema.get("s"), Some(ColumnType::Varchar(360)));
    }

    #[test]
    fn test_varchar_sizing_clamped_to_max() {
        let huge = "y".repeat(10_000);
        let schema = infer(json!({"s": huge}));
        assert_eq!(schema.get("s"), Some(ColumnType::Varchar(5000)));
    }

    #[test]
    fn test_varchar_length_counts_characters() {
        // 200 two-byte characters: 240 after padding.
        let wide = "é".repeat(200);
        let schema = infer(json!({"s": wide}));
        assert_eq!(schema.get("s"), Some(ColumnType::Varchar(240)));
    }

    #[test]
    fn test_all_null_column_is_minimum_varchar() {
        let schema = infer(json!([{"n": null}, {"n": null}]));
        assert_eq!(schema.get("n"), Some(ColumnType::Varchar(200)));
    }

    #[test]
    fn test_nulls_do_not_force_varchar() {
        let schema = infer(json!([{"n": null}, {"n": 5}, {"n": null}]));
        assert_eq!(schema.get("n"), Some(ColumnType::Integer));
    }

    #[test]
    fn test_missing_keys_treated_as_null() {
        let schema = infer(json!([{"a": 1, "b": true}, {"a": 2}, {"a": 3, "b": false}]));
        assert_eq!(schema.get("a"), Some(ColumnType::Integer));
        assert_eq!(schema.get("b"), Some(ColumnType::Boolean));
    }

    #[test]
    fn test_keys_in_first_seen_order() {
        let schema = infer(json!([
            {"b": 1, "a": 1},
            {"a": 2, "c": "x"},
            {"d": true, "c": "y", "b": 3}
        ]));
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_nested_value_sized_by_rendering() {
        let schema = infer(json!({"meta": {"k": "v".repeat(250)}}));
        // {"k":"vvv..."} renders to 258 characters.
        assert_eq!(schema.get("meta"), Some(ColumnType::Varchar(310)));
    }

    #[test]
    fn test_empty_batch_error() {
        let batch = RecordBatch::default();
        let err = infer_schema(&batch, &VarcharSizing::default()).unwrap_err();
        assert_eq!(err.kind, InferenceErrorKind::EmptyBatch);
    }

    #[test]
    fn test_case_folded_keys_collide() {
        let batch = RecordBatch::from_json(json!([{"id": 1}, {"ID": "x"}])).unwrap();
        let err = infer_schema(&batch, &VarcharSizing::default()).unwrap_err();
        assert_eq!(
            err.kind,
            InferenceErrorKind::ColumnCollision {
                first: "id".to_string(),
                second: "ID".to_string(),
                column: "ID".to_string(),
            }
        );
    }

    #[test]
    fn test_observation_tracks_counts() {
        let mut inferred = InferredSchema::new();
        inferred.add_field("x", &json!("abc"));
        inferred.add_field("x", &json!(null));
        inferred.add_field("x", &json!("abcdef"));
        let observation = inferred.observation("x").unwrap();
        assert_eq!(observation.non_null, 2);
        assert_eq!(observation.max_len, 6);
        assert_eq!(inferred.field_count(), 1);
    }
}
