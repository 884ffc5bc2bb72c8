//! Configuration types for catalog construction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Admin API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-10";

/// Configuration for catalog construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL of the store, e.g. `https://example.myshopify.com`.
    pub store_url: String,
    /// Admin API version segment of the GraphQL endpoint.
    pub api_version: String,
    /// Offline access token. Required unless a mock mode is active.
    pub access_token: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
    /// Mock mode for testing and offline demos.
    pub mock_mode: CatalogMockMode,
    pub creation: CreationPolicy,
}

impl CatalogClientConfig {
    pub fn new(store_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            store_url: store_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token,
            extra_headers: BTreeMap::new(),
            user_agent: None,
            mock_mode: CatalogMockMode::None,
            creation: CreationPolicy::default(),
        }
    }

    /// The GraphQL endpoint derived from the store url and api version.
    pub fn graphql_endpoint(&self) -> Result<Url, ConfigError> {
        let invalid = |source| ConfigError::InvalidStoreUrl {
            url: self.store_url.clone(),
            source,
        };

        let mut base = Url::parse(&self.store_url).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("admin/api/{}/graphql.json", self.api_version))
            .map_err(invalid)
    }
}

/// Where responses come from when not talking to a real store.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum CatalogMockMode {
    /// Use the real backend.
    #[default]
    None,
    /// Replay canned responses, in order, from a JSON file.
    Replay(PathBuf),
}

/// Bounds for waiting on asynchronous product creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationPolicy {
    /// Fixed wait between two status polls.
    pub poll_interval: Duration,
    /// Hard limit measured from submission.
    pub timeout: Duration,
}

impl CreationPolicy {
    /// Reject policies that would poll without pause or never wait a full
    /// interval.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidCreationPolicy(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout < self.poll_interval {
            return Err(ConfigError::InvalidCreationPolicy(format!(
                "timeout of {:?} is shorter than the poll interval of {:?}",
                self.timeout, self.poll_interval
            )));
        }
        Ok(())
    }
}

impl Default for CreationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            timeout: Duration::from_secs(120),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_bare_host() {
        let config = CatalogClientConfig::new("https://example.myshopify.com", None);
        assert_eq!(
            config.graphql_endpoint().unwrap().as_str(),
            "https://example.myshopify.com/admin/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let mut config = CatalogClientConfig::new("http://127.0.0.1:8080/proxy", None);
        config.api_version = "2025-01".into();
        assert_eq!(
            config.graphql_endpoint().unwrap().as_str(),
            "http://127.0.0.1:8080/proxy/admin/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn creation_policy_bounds() {
        assert!(CreationPolicy::default().check().is_ok());

        let flooding = CreationPolicy {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            flooding.check(),
            Err(ConfigError::InvalidCreationPolicy(_))
        ));

        let too_short = CreationPolicy {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
        };
        assert!(matches!(
            too_short.check(),
            Err(ConfigError::InvalidCreationPolicy(_))
        ));
    }

    #[test]
    fn endpoint_rejects_garbage() {
        let config = CatalogClientConfig::new("not a url", None);
        assert!(matches!(
            config.graphql_endpoint(),
            Err(ConfigError::InvalidStoreUrl { .. })
        ));
    }
}
