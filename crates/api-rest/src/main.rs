//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `clinrec-run` binary serves the
//! same router after loading `.env`.

use api_rest::{router, AppState};
use clinrec_core::config::{data_dir_from_env_value, page_limit_from_env_value};
use clinrec_core::{CoreConfig, FileStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinrec REST API server.
///
/// # Environment Variables
/// - `CLINREC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINREC_DATA_DIR`: Document store directory (default: "clinrec_data")
/// - `CLINREC_PAGE_LIMIT`: Default page size for listings and searches (default: 50)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinrec_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINREC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CLINREC_DATA_DIR").ok()),
        page_limit_from_env_value(std::env::var("CLINREC_PAGE_LIMIT").ok())?,
    )?);
    let store = Arc::new(FileStore::open(cfg.data_dir())?);

    tracing::info!(
        "-- Starting clinrec REST API on {} (data dir {})",
        addr,
        cfg.data_dir().display()
    );

    let app = router(AppState::new(cfg, store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
