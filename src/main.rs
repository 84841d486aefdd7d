use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use clinrec_core::config::{data_dir_from_env_value, page_limit_from_env_value};
use clinrec_core::{CoreConfig, FileStore};

/// Main entry point for the clinrec application
///
/// Loads `.env`, resolves the configuration once and serves the REST API until interrupted.
///
/// # Environment Variables
/// - `CLINREC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINREC_DATA_DIR`: Document store directory (default: "clinrec_data")
/// - `CLINREC_PAGE_LIMIT`: Default page size for listings and searches (default: 50)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinrec=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINREC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(CoreConfig::new(
        data_dir_from_env_value(std::env::var("CLINREC_DATA_DIR").ok()),
        page_limit_from_env_value(std::env::var("CLINREC_PAGE_LIMIT").ok())?,
    )?);
    let store = Arc::new(FileStore::open(cfg.data_dir())?);

    tracing::info!("++ Starting clinrec REST on {}", rest_addr);
    tracing::info!("++ Document store at {}", cfg.data_dir().display());

    let app = router(AppState::new(cfg, store));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- clinrec stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}
