mod bootstrap;
mod health;
mod routes;

use anyhow::Result;
use fashiondesk_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use fashiondesk_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on config, so config loads first.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        llm_base_url = %app.config.llm.base_url,
        "fashiondesk-server listening"
    );

    let router = routes::router(app.runtime.clone(), app.store.clone());
    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "fashiondesk-server stopping"
    );

    match app.store.save_on_shutdown(&app.config.store).await {
        Ok(Some(saved)) => tracing::info!(
            event_name = "system.server.snapshot_saved",
            correlation_id = "shutdown",
            order_count = saved,
            "order snapshot saved"
        ),
        Ok(None) => {}
        Err(error) => {
            tracing::error!(
                event_name = "system.server.snapshot_failed",
                correlation_id = "shutdown",
                error = %error,
                "order snapshot could not be saved"
            );
            return Err(error.into());
        }
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for ctrl-c, shutting down"
        );
    }
}
