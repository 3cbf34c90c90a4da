//! A catalog client that serves canned responses.
//!
//! Responses are served in the order they were pushed, one per request.
//! They can be seeded in code or read from a JSON file holding an array of
//! [`MockResponse`]s.

use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ClientTrait;
use crate::error::CatalogClientError;
use crate::types::{CatalogResponse, FetchHints, Resource};

pub type MockField<T> = Arc<Mutex<T>>;

/// One canned response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Value,
    /// How long the response takes to arrive.
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_status() -> u16 {
    200
}

impl MockResponse {
    /// A successful response with the given body.
    pub fn json(body: Value) -> Self {
        Self {
            status: default_status(),
            body,
            delay_ms: 0,
        }
    }

    /// A failed response with an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }
}

/// A request received by the [`MockClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub resource: Resource,
    pub hints: FetchHints,
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

/// A catalog client that can be seeded with mock responses
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<MockResponse>>,
    requests: MockField<Vec<MockRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client with responses read from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let responses: Vec<MockResponse> =
            serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        let client = Self::new();
        client
            .mock_responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses);
        Ok(client)
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, response: MockResponse) {
        self.mock_responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Push a successful response with the given body
    pub fn push_json(&self, body: Value) {
        self.push_response(MockResponse::json(body));
    }

    /// All requests received so far, oldest first
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_response(&self, resource: Resource, hints: &FetchHints) -> Option<MockResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockRequest {
                resource,
                hints: hints.clone(),
            });
        self.mock_responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl ClientTrait for MockClient {
    fn fetch_collection<T>(
        &self,
        resource: Resource,
        hints: &FetchHints,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CatalogResponse<T>, CatalogClientError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        // Taken eagerly so the request is recorded even if the caller never
        // polls the future.
        let response = if cancel.is_cancelled() {
            None
        } else {
            self.next_response(resource, hints)
        };
        let cancel = cancel.clone();

        async move {
            if cancel.is_cancelled() {
                return Err(CatalogClientError::Cancelled);
            }
            let Some(response) = response else {
                return Err(CatalogClientError::Other(format!(
                    "mock client has no response left for '{resource}'"
                )));
            };

            if response.delay_ms > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(%resource, "mock request cancelled");
                        return Err(CatalogClientError::Cancelled);
                    },
                    _ = tokio::time::sleep(Duration::from_millis(response.delay_ms)) => {},
                }
            }

            if !(200..300).contains(&response.status) {
                let status_text = reqwest::StatusCode::from_u16(response.status)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                    .unwrap_or_default()
                    .to_string();
                return Err(CatalogClientError::Http {
                    status: response.status,
                    status_text,
                });
            }

            CatalogResponse::from_json(response.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn mock_client_uses_seeded_responses_in_order() {
        let client = MockClient::new();
        client.push_json(json!([{"name": "Luke Skywalker"}]));
        client.push_response(MockResponse::status(503));

        let first = client
            .fetch_collection::<Value>(
                Resource::People,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(first.count, 1);

        let second = client
            .fetch_collection::<Value>(
                Resource::People,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            second.to_string(),
            "catalog request failed: 503 Service Unavailable"
        );

        let third = client
            .fetch_collection::<Value>(
                Resource::People,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(third, CatalogClientError::Other(_)));

        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response_can_be_cancelled() {
        let client = MockClient::new();
        client.push_response(MockResponse::json(json!([])).with_delay(Duration::from_secs(5)));

        let token = CancellationToken::new();
        let hints = FetchHints::default();
        let fetch = client.fetch_collection::<Value>(
            Resource::Films,
            &hints,
            &token,
        );
        token.cancel();

        assert!(fetch.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn parses_response_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(
            br#"[{"body": [{"name": "Tatooine"}]}, {"status": 500}, {"body": [], "delay_ms": 20}]"#,
        )
        .unwrap();
        let client = MockClient::from_file(tmp.path()).unwrap();
        let responses = client.mock_responses.lock().unwrap().clone();
        assert_eq!(responses, VecDeque::from([
            MockResponse::json(json!([{"name": "Tatooine"}])),
            MockResponse::status(500),
            MockResponse::json(json!([])).with_delay(Duration::from_millis(20)),
        ]));
    }

    #[test]
    fn error_when_invalid_json() {
        let tmp = NamedTempFile::new().unwrap();
        // Nothing in the mock data file yet, so it can't be parsed as JSON.
        let err = MockClient::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, MockDataError::ParseJson(_)));
    }
}
