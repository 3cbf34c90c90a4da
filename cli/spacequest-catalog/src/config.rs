//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

/// The public catalog that serves flat (unpaginated) collections.
pub const DEFAULT_CATALOG_URL: &str = "https://swapi.info/api";

/// Configuration for catalog client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API, without a trailing slash.
    pub catalog_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Overrides the default `spacequest/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            extra_headers: BTreeMap::new(),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(60),
            user_agent: None,
        }
    }
}
