//! dummyai server binary.
//!
//! Bootstraps the process: CLI parsing, logging, configuration, the
//! one-time model catalog load, and the HTTP listener. All request
//! handling lives in [`dummyai::server`].

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use dummyai::catalog::ModelCatalog;
use dummyai::config::{Cli, Config};
use dummyai::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "dummyai=debug,tower_http=debug"
    } else {
        "dummyai=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("dummyai v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let config = Arc::new(config);

    // Load the model catalog. A broken catalog aborts startup; serving an
    // empty or wrong model list would silently break client tests.
    let catalog = ModelCatalog::load(&config.catalog.path).with_context(|| {
        format!(
            "loading model catalog from {}",
            config.catalog.path.display()
        )
    })?;

    info!(
        catalog = %config.catalog.path.display(),
        models = catalog.len(),
        chunk_delay_ms = config.stream.chunk_delay_ms,
        "Catalog loaded"
    );

    // Build application state.
    let state = Arc::new(AppState {
        catalog,
        config: config.clone(),
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.listen_addr(cli.listen.as_deref());
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
