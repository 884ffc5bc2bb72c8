//! A transport that can be seeded with canned responses.
//!
//! Responses are handed out in order, one per executed document, and every
//! request is recorded so tests can assert on what was sent. The same
//! responses can be read from a JSON file for offline demos.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{GraphqlError, GraphqlResponse, TransportTrait};

// Arc allows pushing responses from outside after the transport was moved
// into a catalog. Mutex allows sharing across tokio tasks.
type MockField<T> = Arc<Mutex<T>>;

/// One canned backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MockResponse {
    /// A non-2xx HTTP response.
    Status { status: u16, body: String },
    /// A GraphQL response body with data and/or errors.
    Graphql {
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        errors: Vec<GraphqlError>,
    },
}

/// A request as seen by the mock transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub document: String,
    pub variables: Value,
}

impl RecordedRequest {
    /// Name of the executed operation, e.g. `SearchProducts`.
    pub fn operation_name(&self) -> Option<&str> {
        let mut words = self.document.split_whitespace();
        words.find(|word| matches!(*word, "query" | "mutation"))?;
        words
            .next()
            .map(|name| name.split(['(', '{']).next().unwrap_or(name))
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file with mock responses
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// Reads a list of mock responses from disk.
fn read_mock_responses(path: impl AsRef<Path>) -> Result<VecDeque<MockResponse>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    let deserialized: Vec<MockResponse> =
        serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
    Ok(deserialized.into())
}

/// A transport that replays seeded responses.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    responses: MockField<VecDeque<MockResponse>>,
    requests: MockField<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport with responses read from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let responses = read_mock_responses(path)?;
        Ok(Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Default::default(),
        })
    }

    pub fn push_response(&self, response: MockResponse) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Push a successful response carrying `data`.
    pub fn push_data(&self, data: Value) {
        self.push_response(MockResponse::Graphql {
            data: Some(data),
            errors: Vec::new(),
        });
    }

    /// Push a response carrying GraphQL errors only.
    pub fn push_errors<'a>(&self, messages: impl IntoIterator<Item = &'a str>) {
        self.push_response(MockResponse::Graphql {
            data: None,
            errors: messages
                .into_iter()
                .map(|message| GraphqlError {
                    message: message.to_string(),
                })
                .collect(),
        });
    }

    /// Push a non-2xx HTTP response.
    pub fn push_status(&self, status: u16, body: impl Into<String>) {
        self.push_response(MockResponse::Status {
            status,
            body: body.into(),
        });
    }

    /// All requests executed so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    /// Names of the operations executed so far, oldest first.
    pub fn operation_names(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.operation_name().unwrap_or("<anonymous>").to_string())
            .collect()
    }

    /// Number of responses not yet handed out.
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }
}

impl TransportTrait for MockTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, TransportError> {
        let request = RecordedRequest {
            document: document.to_string(),
            variables,
        };
        debug!(operation = ?request.operation_name(), "mock transport received request");
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request);

        let response = self
            .responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front()
            .ok_or(TransportError::MockExhausted)?;

        match response {
            MockResponse::Status { status, body } => Err(TransportError::Status {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body,
            }),
            MockResponse::Graphql { data, errors } => {
                GraphqlResponse { data, errors }.into_result()
            },
        }
    }
}
