use std::sync::Arc;

use fashiondesk_agent::llm::{LlmClient, LlmError, OllamaClient};
use fashiondesk_agent::runtime::{AgentRuntime, ConfiguredOrderId};
use fashiondesk_agent::tools::ToolRegistry;
use fashiondesk_core::config::{AppConfig, ConfigError, LoadOptions};
use fashiondesk_core::sop::{SopError, SopRegistry};
use fashiondesk_db::{OrderStore, StoreError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<OrderStore>,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("sop registry failed to load: {0}")]
    Sop(#[from] SopError),
    #[error("order store failed to open: {0}")]
    Store(#[from] StoreError),
    #[error("llm client failed to initialize: {0}")]
    Llm(#[from] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.llm)?);
    bootstrap_with_llm(config, llm).await
}

/// Wires the application around an already-built generation backend.
pub async fn bootstrap_with_llm(
    config: AppConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_model = %config.llm.model,
        "starting application bootstrap"
    );

    let sops = Arc::new(SopRegistry::from_config(&config.sop)?);
    let store = Arc::new(OrderStore::from_config(&config.store).await?);
    info!(
        event_name = "system.bootstrap.store_ready",
        correlation_id = "bootstrap",
        order_count = store.len().await,
        snapshot = config.store.snapshot_path.is_some(),
        "order store ready"
    );

    let tools = Arc::new(ToolRegistry::standard(Arc::clone(&store), Arc::clone(&sops)));
    let runtime = Arc::new(AgentRuntime::new(
        llm,
        sops,
        tools,
        ConfiguredOrderId::new(config.agent.default_order_id.as_str()),
    ));

    Ok(Application { config, store, runtime })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use fashiondesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use tempfile::TempDir;

    use super::{bootstrap, bootstrap_with_config, BootstrapError};

    #[tokio::test]
    async fn bootstrap_rejects_invalid_llm_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_base_url: Some("localhost:11434".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("llm.base_url"));
    }

    #[tokio::test]
    async fn bootstrap_seeds_store_when_snapshot_is_missing() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = AppConfig::default();
        config.store.snapshot_path = Some(dir.path().join("orders.json"));

        let app = bootstrap_with_config(config).await.expect("bootstrap");

        assert_eq!(app.store.len().await, 3);
        assert_eq!(app.runtime.tools().len(), 3);
    }

    #[tokio::test]
    async fn bootstrap_fails_on_unreadable_sop_file() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = AppConfig::default();
        config.sop.order_path = Some(dir.path().join("missing-order-sop.txt"));

        let result = bootstrap_with_config(config).await;

        assert!(matches!(result, Err(BootstrapError::Sop(_))));
    }

    #[tokio::test]
    async fn bootstrap_fails_on_corrupt_snapshot() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("orders.json");
        fs::write(&path, "[{").expect("write");
        let mut config = AppConfig::default();
        config.store.snapshot_path = Some(path);

        let result = bootstrap_with_config(config).await;

        assert!(matches!(result, Err(BootstrapError::Store(_))));
    }
}
