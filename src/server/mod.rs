//! HTTP server for the fraud detection pipeline
//!
//! Exposes upload-and-train, single-record prediction, and current-model
//! introspection over a small REST API.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::config::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the server with the given settings
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.upload_dir)?;
    std::fs::create_dir_all(&settings.model_dir)?;
    info!(
        upload_dir = %settings.upload_dir,
        model_dir = %settings.model_dir,
        "initialized server directories"
    );

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let max_upload_mb = settings.max_upload_size_mb();

    let state = Arc::new(AppState::new(settings));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        max_upload_size_mb = max_upload_mb,
        "fraud detection server listening"
    );

    let shutdown_signal = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    Ok(())
}
