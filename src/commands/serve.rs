//! Serve command implementation

use crate::api::{self, AppState};
use crate::config::Config;
use crate::db::Db;
use crate::error::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the HTTP API until interrupted
pub async fn cmd_serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let db = Db::connect(config).await?;
    db.migrate().await?;

    let state = AppState::from_config(config, db)?;
    info!("PDF store: {}", state.store.describe());
    if state.webhook_id.is_none() {
        warn!("paypal.webhook_id is not set; webhooks are applied without signature checks");
    }

    let app = api::router(Arc::new(state));
    let listener = TcpListener::bind((host.as_str(), port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
