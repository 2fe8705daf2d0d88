use anyhow::Result;
use clap::Parser;
use lading_database::connector_for;
use lading_server::{
    AppState, BridgeConfig, Credentials, IngestionPipeline, ObservabilityConfig, RecordFetcher,
    create_router, init_observability,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lading API-to-warehouse bridge", long_about = None)]
struct Args {
    /// Configuration file layered over the bundled defaults (default: ./lading.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::load()?,
    };
    let config = match args.bind {
        Some(bind) => config.with_bind(bind),
        None => config,
    };

    init_observability(&ObservabilityConfig {
        log_level: config.server().log_level().clone(),
        json_logs: args.json_logs,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let connector = connector_for(
        *config.warehouse().dialect(),
        config.warehouse().resolve_url()?,
    );
    let pipeline = IngestionPipeline::new(
        RecordFetcher::new(config.fetch().timeout()),
        connector,
        config.warehouse().schema(),
        *config.limits().varchar(),
        *config.limits().write(),
    );
    let state = AppState::new(
        pipeline,
        Credentials::new(config.auth().username(), config.auth().password()),
        *config.preview().preview_limit(),
        *config.preview().infer_limit(),
    );

    let listener = tokio::net::TcpListener::bind(config.server().bind()).await?;
    info!(
        bind = %config.server().bind(),
        schema = %config.warehouse().schema(),
        dialect = %config.warehouse().dialect(),
        "Starting lading bridge server"
    );
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
