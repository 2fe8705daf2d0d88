//! HTTP bridge that ingests remote JSON APIs into a warehouse.
//!
//! Each ingestion request fetches JSON from a remote endpoint, infers a
//! relational schema for the records, creates the target table if it is
//! missing and writes every record into it with an upload timestamp.
//!
//! # Example
//!
//! ```rust,no_run
//! use lading_database::MemoryWarehouse;
//! use lading_server::{AppState, BridgeConfig, Credentials, IngestionPipeline, RecordFetcher, create_router};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::bundled()?;
//! let pipeline = IngestionPipeline::new(
//!     RecordFetcher::new(config.fetch().timeout()),
//!     Arc::new(MemoryWarehouse::default()),
//!     config.warehouse().schema(),
//!     *config.limits().varchar(),
//!     *config.limits().write(),
//! );
//! let state = AppState::new(pipeline, Credentials::new("admin", "secret"), 5, 10);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod auth;
mod config;
mod fetch;
mod observability;
mod pipeline;

pub use api::{ApiError, AppState, create_router};
pub use auth::{Credentials, constant_time_eq, parse_basic_auth_header, require_basic_auth};
pub use config::{
    AuthSection, BridgeConfig, FetchSection, LimitsSection, PreviewSection, ServerSection,
    WarehouseSection, vcap_credentials,
};
pub use fetch::{RecordFetcher, render_query_params};
pub use observability::{ObservabilityConfig, init_observability};
pub use pipeline::{IngestReport, IngestRequest, IngestionPipeline};
