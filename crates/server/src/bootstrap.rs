use std::sync::Arc;

use shopmate_agent::llm::GeminiClient;
use shopmate_agent::runtime::AgentRuntime;
use shopmate_agent::tools::HttpCatalogClient;
use shopmate_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: AgentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client construction failed: {0}")]
    LlmClient(#[source] anyhow::Error),
    #[error("catalog client construction failed: {0}")]
    CatalogClient(#[source] anyhow::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let llm = GeminiClient::new(&config.llm).map_err(BootstrapError::LlmClient)?;
    let catalog = HttpCatalogClient::new(&config.catalog).map_err(BootstrapError::CatalogClient)?;
    info!(
        event_name = "system.bootstrap.clients_ready",
        model = %config.llm.model,
        catalog_base_url = %config.catalog.base_url,
        "outbound clients constructed"
    );

    let runtime = AgentRuntime::new(Arc::new(llm), Arc::new(catalog));
    Ok(Application { config, runtime })
}
