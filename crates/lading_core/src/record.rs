//! Records and record batches.

use lading_error::{InputError, InputErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One JSON object: an ordered mapping from key to dynamically-typed value.
pub type Record = Map<String, JsonValue>;

/// The full set of JSON objects fetched in one ingestion call.
///
/// Records are kept in arrival order and never mutated once the batch is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordBatch {
    records: Vec<Record>,
}

impl RecordBatch {
    /// Wrap already-parsed records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Normalize a remote JSON body into a batch.
    ///
    /// An object becomes a one-element batch, an array must contain only
    /// objects. Anything else, including an empty array, is a client-input error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lading_core::RecordBatch;
    /// use serde_json::json;
    ///
    /// let batch = RecordBatch::from_json(json!({"id": 1})).unwrap();
    /// assert_eq!(batch.len(), 1);
    ///
    /// assert!(RecordBatch::from_json(json!([1, 2])).is_err());
    /// ```
    pub fn from_json(body: JsonValue) -> Result<Self, InputError> {
        match body {
            JsonValue::Object(record) => Ok(Self::new(vec![record])),
            JsonValue::Array(items) => {
                if items.is_empty() {
                    return Err(InputError::new(InputErrorKind::EmptyResponse));
                }
                let records = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| match item {
                        JsonValue::Object(record) => Ok(record),
                        _ => Err(InputError::new(InputErrorKind::NotAnObject { index })),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(count = records.len(), "Normalized JSON array into record batch");
                Ok(Self::new(records))
            }
            other => Err(InputError::new(InputErrorKind::UnexpectedShape(
                json_type_name(&other).to_string(),
            ))),
        }
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over records in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// A new batch holding at most the first `limit` records.
    pub fn head(&self, limit: usize) -> Self {
        Self::new(self.records.iter().take(limit).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a RecordBatch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
