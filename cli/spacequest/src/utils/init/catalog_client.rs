use std::time::Duration;

use anyhow::{Context, Result, bail};
use spacequest_sdk::catalog::{
    CatalogClient,
    CatalogClientConfig,
    Client,
    DEFAULT_CATALOG_URL,
    MockClient,
};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog client
///
/// - Initialize a mock client if `catalog_mock` points at a file of canned responses
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    if let Some(path) = &config.catalog_mock {
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        let client = MockClient::from_file(path)
            .with_context(|| format!("could not load mock data from {}", path.display()))?;
        return Ok(client.into());
    }

    // If not configured, use the default URL
    let catalog_url = config
        .catalog_url
        .clone()
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

    let client_config = CatalogClientConfig {
        catalog_url,
        extra_headers: config.extra_headers.clone(),
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        user_agent: None,
    };

    let client = CatalogClient::new(client_config).context("could not create catalog client")?;
    debug!("using catalog client with url: {}", client.catalog_url());
    Ok(client.into())
}
