//! Fetch, infer, provision, write.

use crate::RecordFetcher;
use lading_core::{RecordBatch, Schema, TableHandle, VarcharSizing, WriteOptions};
use lading_database::{
    RowsWritten, TableStatus, WarehouseConnector, ensure_table, infer_schema, write_batch,
};
use lading_error::{BackendError, InputError, InputErrorKind, LadingResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::instrument;

/// Body of an ingestion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Remote URL to GET
    pub endpoint: String,
    /// Table to write into; upper-cased before use
    pub target_table: String,
    /// Query parameters sent with the GET
    #[serde(default)]
    pub query_params: Option<Map<String, JsonValue>>,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct IngestReport {
    /// Human-readable summary
    message: String,
    /// Rows committed
    rows_written: usize,
    /// Upper-cased target table name
    table: String,
    /// Whether this request created the table
    created: bool,
}

/// Drives one ingestion per call.
///
/// Store work runs on the blocking pool with a connection opened for that
/// call alone and dropped before it returns.
#[derive(Clone)]
pub struct IngestionPipeline {
    fetcher: RecordFetcher,
    connector: Arc<dyn WarehouseConnector>,
    schema: String,
    sizing: VarcharSizing,
    write_options: WriteOptions,
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("schema", &self.schema)
            .field("sizing", &self.sizing)
            .field("write_options", &self.write_options)
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    /// Create a pipeline writing into `schema`.
    pub fn new(
        fetcher: RecordFetcher,
        connector: Arc<dyn WarehouseConnector>,
        schema: impl Into<String>,
        sizing: VarcharSizing,
        write_options: WriteOptions,
    ) -> Self {
        Self {
            fetcher,
            connector,
            schema: schema.into(),
            sizing,
            write_options,
        }
    }

    /// Namespace tables are created in.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Fetch the endpoint and write every record into the target table.
    #[instrument(
        name = "pipeline.ingest",
        skip(self, request),
        fields(endpoint = %request.endpoint, target_table = %request.target_table)
    )]
    pub async fn ingest(&self, request: IngestRequest) -> LadingResult<IngestReport> {
        if request.target_table.trim().is_empty() {
            return Err(InputError::new(InputErrorKind::EmptyTableName).into());
        }

        let batch = self
            .fetcher
            .fetch(&request.endpoint, request.query_params.as_ref())
            .await?;

        let handle = TableHandle::new(&self.schema, &request.target_table);
        let connector = Arc::clone(&self.connector);
        let sizing = self.sizing;
        let write_options = self.write_options;
        let task_handle = handle.clone();

        let (status, written) = tokio::task::spawn_blocking(
            move || -> LadingResult<(TableStatus, RowsWritten)> {
                let schema = infer_schema(&batch, &sizing)?;
                let mut warehouse = connector.connect()?;
                let status = ensure_table(warehouse.as_mut(), &task_handle, &schema)?;
                let written = write_batch(
                    warehouse.as_mut(),
                    &task_handle,
                    &schema,
                    &batch,
                    &write_options,
                )?;
                Ok((status, written))
            },
        )
        .await
        .map_err(|e| BackendError::new(format!("Ingestion task failed: {}", e)))??;

        let table = handle.table().to_string();
        tracing::info!(rows = written.count(), table = %handle, %status, "Ingestion complete");

        Ok(IngestReport {
            message: format!("{} records inserted into {}", written.count(), table),
            rows_written: written.count(),
            table,
            created: status.was_created(),
        })
    }

    /// Fetch the endpoint and return at most `limit` records.
    #[instrument(name = "pipeline.preview", skip(self))]
    pub async fn preview(&self, endpoint: &str, limit: usize) -> LadingResult<RecordBatch> {
        let batch = self.fetcher.fetch(endpoint, None).await?;
        Ok(batch.head(limit))
    }

    /// Fetch the endpoint and infer a schema over at most `limit` records.
    #[instrument(name = "pipeline.infer_types", skip(self))]
    pub async fn infer_types(&self, endpoint: &str, limit: usize) -> LadingResult<Schema> {
        let batch = self.fetcher.fetch(endpoint, None).await?.head(limit);
        Ok(infer_schema(&batch, &self.sizing)?)
    }

    /// Open a connection and run the dialect's connectivity check.
    #[instrument(name = "pipeline.test_connection", skip(self))]
    pub async fn test_connection(&self) -> LadingResult<i32> {
        let connector = Arc::clone(&self.connector);
        let result = tokio::task::spawn_blocking(move || -> LadingResult<i32> {
            let mut warehouse = connector.connect()?;
            Ok(warehouse.ping()?)
        })
        .await
        .map_err(|e| BackendError::new(format!("Connection check failed: {}", e)))??;
        tracing::debug!(result, "Connectivity check succeeded");
        Ok(result)
    }
}
