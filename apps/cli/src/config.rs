//! Configuration loading and client construction for the CLI.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use terra_abstraction::Transport;
use terra_client::{
    BatchClient, ClientConfig, HttpTransport, ResponseCache, SingleRequestClient,
};
use tracing::debug;

/// Loads configuration from `path`, or discovers it when no path is given.
///
/// An explicit endpoint overrides whatever the file says.
pub fn load_config(path: Option<&Path>, endpoint: Option<String>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ClientConfig::discover_and_load(),
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
        config.validate().context("Invalid --endpoint")?;
    }

    debug!(endpoint = %config.endpoint, "Loaded client configuration");
    Ok(config)
}

/// The clients every command works with, sharing one transport.
pub struct Clients {
    pub batch: BatchClient,
    pub single: SingleRequestClient,
    pub endpoint: String,
}

impl Clients {
    pub fn build(config: &ClientConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::from_config(config).context("Failed to create HTTP transport")?);
        let batch = BatchClient::new(Arc::clone(&transport), config.batch.clone())
            .context("Invalid batch configuration")?;
        let cache = ResponseCache::new(config.cache.clone()).context("Invalid cache configuration")?;
        let single = SingleRequestClient::with_cache(transport, cache);

        Ok(Self { batch, single, endpoint: config.endpoint.clone() })
    }
}
