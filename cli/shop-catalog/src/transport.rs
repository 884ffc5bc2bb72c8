//! The request/response transport to the admin GraphQL API.

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::{CatalogClientConfig, CatalogMockMode};
use crate::error::{ConfigError, TransportError};
use crate::mock::MockTransport;

const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Longest error body kept in [TransportError::Status].
const MAX_ERROR_BODY: usize = 512;

/// Issues a single GraphQL document against the backend.
///
/// Implementations own authentication and connection details. Failures are
/// returned as-is; retrying is up to the implementation, never the caller.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait TransportTrait {
    /// Execute `document` with `variables` and return the `data` member of
    /// the response. GraphQL level errors are reported as
    /// [TransportError::Graphql].
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, TransportError>;
}

/// Either a transport to the real backend,
/// or a mock transport for testing.
#[derive(Debug)]
#[enum_dispatch(TransportTrait)]
pub enum Transport {
    Http(HttpTransport),
    Mock(MockTransport),
}

impl Transport {
    /// Build the transport selected by `config`.
    pub fn from_config(config: &CatalogClientConfig) -> Result<Self, ConfigError> {
        match &config.mock_mode {
            CatalogMockMode::None => Ok(Transport::Http(HttpTransport::new(config)?)),
            CatalogMockMode::Replay(path) => {
                debug!(?path, "replaying catalog responses from file");
                Ok(Transport::Mock(MockTransport::from_file(path)?))
            },
        }
    }

    /// Execute `document` and decode the response data into `T`.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: Value,
    ) -> Result<T, TransportError> {
        let data = self.execute(document, variables).await?;
        serde_json::from_value(data).map_err(TransportError::Decode)
    }
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse {
    #[serde(default)]
    pub(crate) data: Option<Value>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphqlError>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GraphqlError {
    pub message: String,
}

impl GraphqlResponse {
    /// Split a decoded response into data or an aggregated error.
    pub(crate) fn into_result(self) -> Result<Value, TransportError> {
        if !self.errors.is_empty() {
            let messages = self
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TransportError::Graphql(messages));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

/// HTTP transport to the admin GraphQL endpoint.
///
/// The underlying [reqwest::Client] is stateless between requests and is
/// shared by all calls through the owning [crate::Catalog].
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport, failing if no access token is configured.
    pub fn new(config: &CatalogClientConfig) -> Result<Self, ConfigError> {
        let endpoint = config.graphql_endpoint()?;
        let client = build_http_client(config)?;
        Ok(Self { client, endpoint })
    }
}

impl TransportTrait for HttpTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GraphqlRequest {
                query: document,
                variables,
            })
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            // The body may be an HTML error page, keep only the start of it.
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|index| body.is_char_boundary(*index))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(TransportError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(TransportError::Request)?;
        let response: GraphqlResponse =
            serde_json::from_slice(&bytes).map_err(TransportError::Decode)?;
        response.into_result()
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build HTTP client with access token auth for the admin API.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, ConfigError> {
    let token = config
        .access_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingAccessToken)?;

    let mut headers = HeaderMap::new();
    let mut token_value = header::HeaderValue::from_str(token)
        .map_err(|_| ConfigError::InvalidHeader(ACCESS_TOKEN_HEADER.to_string()))?;
    token_value.set_sensitive(true);
    headers.insert(
        header::HeaderName::from_static(ACCESS_TOKEN_HEADER),
        token_value,
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(|_| ConfigError::InvalidHeader(key.clone()))?,
            header::HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidHeader(key.clone()))?,
        );
    }

    debug!(
        store_url = %config.store_url,
        api_version = %config.api_version,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder.build().map_err(ConfigError::HttpClient)
}
