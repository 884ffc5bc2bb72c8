use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use serde::Deserialize;
use shop_catalog::{CatalogClientConfig, CatalogMockMode, CreationPolicy, DEFAULT_API_VERSION};
use tracing::debug;

/// Name of shopcat managed directories
const SHOPCAT_DIR_NAME: &str = "shopcat";
pub const SHOPCAT_CONFIG_FILE: &str = "shopcat.toml";
const ENV_PREFIX: &str = "SHOPCAT";

/// Settings for talking to a store
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the store, e.g. `https://example.myshopify.com`
    pub store_url: Option<String>,
    /// Admin API version
    pub api_version: String,
    /// Admin API access token
    pub access_token: Option<String>,
    /// Additional headers sent with every request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
    /// Replay responses from this file instead of talking to a store
    pub mock_data: Option<PathBuf>,
    /// Wait between polls of a background product creation
    pub poll_interval_ms: u64,
    /// Give up waiting for a background product creation after this long
    pub timeout_secs: u64,
}

/// Where configuration is read from, lowest precedence first.
#[derive(Debug, Default)]
pub struct ConfigSources {
    /// `$XDG_CONFIG_HOME/shopcat/shopcat.toml`, optional
    pub user_file: Option<PathBuf>,
    /// A file passed with `--config`, must exist
    pub explicit_file: Option<PathBuf>,
    /// `SHOPCAT_*` variables with the prefix already stripped
    pub environment: HashMap<String, String>,
}

impl ConfigSources {
    /// The sources of the running process.
    pub fn from_process(explicit_file: Option<&Path>) -> Self {
        let user_file = dirs::config_dir().map(|dir| dir.join(SHOPCAT_DIR_NAME).join(SHOPCAT_CONFIG_FILE));
        let prefix = format!("{ENV_PREFIX}_");
        let environment = env::vars()
            .filter_map(|(key, value)| key.strip_prefix(&prefix).map(|key| (key.to_owned(), value)))
            // consumed by the logger
            .filter(|(key, _)| key != "VERBOSITY")
            .collect();

        Self {
            user_file,
            explicit_file: explicit_file.map(Path::to_path_buf),
            environment,
        }
    }
}

impl Config {
    /// Merge defaults, config files and environment into a [Config]
    pub fn load(sources: ConfigSources) -> Result<Config> {
        let policy = CreationPolicy::default();
        let mut builder = HierarchicalConfig::builder()
            .set_default("api_version", DEFAULT_API_VERSION)?
            .set_default("poll_interval_ms", policy.poll_interval.as_millis() as u64)?
            .set_default("timeout_secs", policy.timeout.as_secs())?;

        if let Some(user_file) = sources.user_file {
            debug!(path = ?user_file, "looking for user config");
            builder = builder.add_source(
                config::File::from(user_file)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(explicit_file) = sources.explicit_file {
            debug!(path = ?explicit_file, "reading explicit config");
            builder = builder.add_source(
                config::File::from(explicit_file)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let environment = sources
            .environment
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect::<HashMap<_, _>>();
        let builder = builder.add_source(
            Environment::default()
                .source(Some(environment))
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")
    }

    /// Client configuration for the catalog library
    pub fn client_config(&self) -> Result<CatalogClientConfig> {
        let mock_mode = match &self.mock_data {
            Some(path) => CatalogMockMode::Replay(path.clone()),
            None => CatalogMockMode::None,
        };

        let store_url = match (&self.store_url, &mock_mode) {
            (Some(url), _) => url.clone(),
            // never contacted when replaying
            (None, CatalogMockMode::Replay(_)) => "http://localhost".to_string(),
            (None, CatalogMockMode::None) => anyhow::bail!(
                "No store configured. Set 'store_url' in {SHOPCAT_CONFIG_FILE} or {ENV_PREFIX}_STORE_URL"
            ),
        };

        Ok(CatalogClientConfig {
            store_url,
            api_version: self.api_version.clone(),
            access_token: self.access_token.clone(),
            extra_headers: self.extra_headers.clone(),
            user_agent: Some(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| format!("shopcat/{}", env!("CARGO_PKG_VERSION"))),
            ),
            mock_mode,
            creation: CreationPolicy {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_secs(self.timeout_secs),
            },
        })
    }
}
