//! FashionDesk MCP server binary
//!
//! Speaks MCP over stdio; logs go to stderr so stdout stays a clean
//! protocol channel.
//!
//! ## Usage
//!
//! ```bash
//! # Seed orders only, nothing persisted
//! fashiondesk-mcp
//!
//! # Load orders from a snapshot and write them back on exit
//! FASHIONDESK_STORE_SNAPSHOT_PATH=data/orders.json \
//! FASHIONDESK_STORE_SAVE_ON_SHUTDOWN=true fashiondesk-mcp
//! ```

use std::sync::Arc;

use anyhow::Result;
use fashiondesk_core::config::{AppConfig, LoadOptions, LogFormat};
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;
use fashiondesk_mcp::FashionDeskMcpServer;
use tracing::{info, Level};

fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let store = Arc::new(OrderStore::from_config(&config.store).await?);
    let sops = Arc::new(SopRegistry::from_config(&config.sop)?);
    info!(
        event_name = "mcp.bootstrap.ready",
        order_count = store.len().await,
        correlation_id = "bootstrap",
        "order store ready"
    );

    FashionDeskMcpServer::new(Arc::clone(&store), sops).run_stdio().await?;

    if let Some(saved) = store.save_on_shutdown(&config.store).await? {
        info!(
            event_name = "mcp.shutdown.snapshot_saved",
            order_count = saved,
            correlation_id = "shutdown",
            "order snapshot saved on shutdown"
        );
    }
    Ok(())
}
