//! Error handling for catalog operations.

use std::fmt;

use thiserror::Error;

use crate::ids::ResourceKind;
use crate::types::OperationStatus;

/// Common error type for catalog operations.
///
/// Every variant is handled per call; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("'{value}' is not a valid {kind} identifier")]
    InvalidIdentifier { value: String, kind: ResourceKind },
    #[error("'{value}' is not supported as a {kind} identifier, expected a numeric id or a global id")]
    UnsupportedIdentifier { value: String, kind: ResourceKind },
    #[error("pagination stalled: cursor '{cursor}' was returned twice in a row")]
    PaginationStalled { cursor: String },
    #[error("backend violated its contract: {0}")]
    ProtocolViolation(String),
    #[error("product creation was rejected: {0}")]
    CreationRejected(String),
    #[error("product creation did not finish in time (last status: {last_status})")]
    CreationTimedOut { last_status: OperationStatus },
    #[error("product creation was cancelled while waiting (last status: {last_status})")]
    Cancelled { last_status: OperationStatus },
    #[error("product '{0}' was not found")]
    ProductNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(ValidationErrors),
    #[error(transparent)]
    TransportError(#[from] TransportError),
}

/// Failures of the transport collaborator.
///
/// Transport failures are never retried by the catalog.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to catalog backend failed")]
    Request(#[source] reqwest::Error),
    #[error("catalog backend responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode catalog backend response")]
    Decode(#[source] serde_json::Error),
    #[error("catalog backend returned errors: {0}")]
    Graphql(String),
    #[error("mock transport has no response left for request")]
    MockExhausted,
}

/// Failures while building a catalog from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an access token is required to talk to the catalog backend")]
    MissingAccessToken,
    #[error("invalid store url '{url}'")]
    InvalidStoreUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid creation policy: {0}")]
    InvalidCreationPolicy(String),
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("failed to build http client")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    MockData(#[from] crate::mock::MockDataError),
}

/// A single broken validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the rule that produced this violation.
    pub rule: &'static str,
    /// Dotted path of the offending field, e.g. `variants.3.optionValues`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.rule)
    }
}

/// All violations found for one request, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Whether any violation was produced by `rule`.
    pub fn contains_rule(&self, rule: &str) -> bool {
        self.0.iter().any(|violation| violation.rule == rule)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// A user-facing error reported by the backend for a mutation or operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Aggregates backend user errors into one human readable message.
pub(crate) fn fmt_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|error| match error.field.as_deref() {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), error.message),
            _ => error.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_joined_with_field_paths() {
        let errors = vec![
            UserError {
                field: Some(vec!["input".into(), "title".into()]),
                message: "Title can't be blank".into(),
                code: Some("BLANK".into()),
            },
            UserError {
                field: None,
                message: "Something else".into(),
                code: None,
            },
        ];
        assert_eq!(
            fmt_user_errors(&errors),
            "input.title: Title can't be blank; Something else"
        );
    }

    #[test]
    fn validation_errors_display_every_violation() {
        let errors = ValidationErrors(vec![
            Violation {
                rule: "title_present",
                path: "title".into(),
                message: "must not be blank".into(),
            },
            Violation {
                rule: "variant_count",
                path: "variants".into(),
                message: "at most 100 variants".into(),
            },
        ]);
        assert_eq!(
            errors.to_string(),
            "title: must not be blank [title_present]; variants: at most 100 variants [variant_count]"
        );
        assert!(errors.contains_rule("variant_count"));
    }
}
