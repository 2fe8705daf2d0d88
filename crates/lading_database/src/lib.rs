//! Schema inference and warehouse integration for lading.
//!
//! This crate turns a batch of heterogeneous JSON records into a relational
//! schema, makes sure a matching table exists, and writes the records into it.
//!
//! # Features
//!
//! - Per-column type inference with mixed-type degradation to text
//! - Padded VARCHAR sizing within configurable bounds
//! - Idempotent table provisioning that tolerates concurrent creators
//! - Parameterized batch inserts with a single commit
//! - SAP HANA warehouse over hdbconnect, selected by [`Dialect`]
//! - Diesel-based PostgreSQL warehouse and an in-memory warehouse
//!
//! # Example
//!
//! ```rust
//! use lading_core::{RecordBatch, TableHandle, VarcharSizing, WriteOptions};
//! use lading_database::{ensure_table, infer_schema, write_batch, MemoryWarehouse};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let batch = RecordBatch::from_json(json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]))?;
//! let schema = infer_schema(&batch, &VarcharSizing::default())?;
//!
//! let mut warehouse = MemoryWarehouse::default();
//! let handle = TableHandle::new("my_schema", "events");
//! ensure_table(&mut warehouse, &handle, &schema)?;
//! let written = write_batch(&mut warehouse, &handle, &schema, &batch, &WriteOptions::default())?;
//! assert_eq!(written.count(), 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod batch_writer;
mod connection;
mod dialect;
mod hana;
mod memory;
mod postgres;
mod provisioner;
mod warehouse;

// Public modules for external access
pub mod schema_inference;

pub use batch_writer::{RowsWritten, serialize_record, serialize_value, write_batch, write_batch_at};
pub use connection::{PgConnector, connector_for, establish_connection};
pub use dialect::Dialect;
pub use hana::{HanaConnector, HanaWarehouse};
pub use memory::{MemoryTable, MemoryWarehouse};
pub use postgres::PgWarehouse;
pub use provisioner::{TableStatus, ensure_table};
pub use schema_inference::{classify_value, infer_schema, is_iso_datetime};
pub use warehouse::{SqlParam, Warehouse, WarehouseConnector};

pub use lading_error::{DatabaseError, DatabaseErrorKind};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
