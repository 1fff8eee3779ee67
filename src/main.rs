//! CyberQuest server entry point

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use cyberquest::config::Config;
use cyberquest::database::DatabaseManager;
use cyberquest::logging::{init_logging, log_startup};
use cyberquest::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;

    init_logging(&config);
    log_startup(&config);
    config.log_config();

    let database = DatabaseManager::new(&config.database_url).await?;
    database.migrate().await?;
    database.test_connection().await?;
    info!("Database ready ({} connections)", database.pool_size());

    let addr = config.bind_address();
    let state = AppState::new(config, Arc::new(database))?;
    let app = create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("CyberQuest listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("CyberQuest stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
