//! Core data types for the lading ingestion bridge.
//!
//! This crate holds the values that flow through an ingestion call: the
//! record batch fetched from a remote API, the column types inferred for it,
//! and the handle of the table it lands in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod column;
mod limits;
mod record;
mod schema;
mod table;

pub use column::{ColumnType, TypeTag};
pub use limits::{VarcharSizing, WriteOptions};
pub use record::{Record, RecordBatch};
pub use schema::{ColumnSpec, Schema, SYSTEM_COLUMN};
pub use table::TableHandle;
