use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use spacequest_sdk::catalog::CatalogClientConfig;
use spacequest_sdk::models::debounce::SEARCH_DEBOUNCE;
use tracing::debug;
use xdg::BaseDirectories;

/// Name of spacequest managed directories
const SPACEQUEST_DIR_NAME: &str = "spacequest";
const SPACEQUEST_CONFIG_DIR_VAR: &str = "SPACEQUEST_CONFIG_DIR";
const SPACEQUEST_ENV_PREFIX: &str = "SPACEQUEST_";
pub const SPACEQUEST_CONFIG_FILE: &str = "spacequest.toml";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// The URL of the catalog to read from
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: Option<String>,

    /// Quiet period after the last keystroke before a search is applied
    pub search_debounce_ms: u64,

    /// Upper bound for a whole catalog request
    pub request_timeout_secs: u64,

    /// Upper bound for establishing a connection to the catalog
    pub connect_timeout_secs: u64,

    /// Headers sent along with every catalog request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// JSON file of canned responses served instead of the catalog
    pub catalog_mock: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let client_defaults = CatalogClientConfig::default();
        Self {
            catalog_url: None,
            search_debounce_ms: SEARCH_DEBOUNCE.as_millis() as u64,
            request_timeout_secs: client_defaults.request_timeout.as_secs(),
            connect_timeout_secs: client_defaults.connect_timeout.as_secs(),
            extra_headers: BTreeMap::new(),
            catalog_mock: None,
        }
    }
}

impl Config {
    /// Creates a [Config] from the config files and the environment
    ///
    /// Later sources override earlier ones:
    ///
    /// 1. built-in defaults
    /// 2. `/etc/spacequest.toml`
    /// 3. `spacequest/spacequest.toml` in the XDG config directories
    /// 4. `spacequest.toml` in `$SPACEQUEST_CONFIG_DIR`
    /// 5. `SPACEQUEST_*` environment variables
    pub fn parse() -> Result<Config> {
        let final_config = read_raw_config()?;
        let cli_config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(cli_config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn read_raw_config() -> Result<HierarchicalConfig> {
    let defaults = Config::default();
    let spacequest_dirs = BaseDirectories::with_prefix(SPACEQUEST_DIR_NAME);

    let mut builder = HierarchicalConfig::builder()
        .set_default("search_debounce_ms", defaults.search_debounce_ms as i64)?
        .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
        .set_default("connect_timeout_secs", defaults.connect_timeout_secs as i64)?;

    // read from /etc
    builder = builder.add_source(
        config::File::from(PathBuf::from("/etc").join(SPACEQUEST_CONFIG_FILE))
            .format(config::FileFormat::Toml)
            .required(false),
    );

    // look for files in XDG_CONFIG_DIRS locations
    for file in spacequest_dirs.find_config_files(SPACEQUEST_CONFIG_FILE) {
        debug!(path = %file.display(), "reading config file");
        builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
    }

    // Add explicit SPACEQUEST_CONFIG_DIR file last
    if let Ok(config_dir) = env::var(SPACEQUEST_CONFIG_DIR_VAR) {
        debug!("`${SPACEQUEST_CONFIG_DIR_VAR}` set: {config_dir}");
        builder = builder.add_source(
            config::File::from(PathBuf::from(config_dir).join(SPACEQUEST_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );
    }

    // override via env variables
    let spacequest_envs = env::vars()
        .filter(|(k, _)| k != SPACEQUEST_CONFIG_DIR_VAR)
        .filter_map(|(k, v)| {
            k.strip_prefix(SPACEQUEST_ENV_PREFIX)
                .map(|k| (k.to_owned(), v))
        })
        .collect::<HashMap<_, _>>();

    let builder = builder.add_source(
        Environment::default()
            .source(Some(spacequest_envs))
            .try_parsing(true),
    );

    Ok(builder.build()?)
}
