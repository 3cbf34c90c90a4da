//! Catalog client over `reqwest`.

use std::fmt::Debug;
use std::future::Future;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::mock::MockClient;
use crate::types::{CatalogResponse, FetchHints, Resource};

/// A client for the catalog service.
///
/// Handles:
/// - HTTP client configuration with timeouts
/// - default and extra headers
/// - turning each list endpoint into a [`CatalogResponse`]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        // The list endpoints have no trailing slash, so neither may the base.
        let trimmed = config.catalog_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|source| CatalogClientError::InvalidUrl {
            url: config.catalog_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::Other(format!(
                "catalog url '{}' cannot be used as a base url",
                config.catalog_url
            )));
        }

        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// The list endpoint of `resource` with the hints as query parameters.
    fn collection_url(&self, resource: Resource, hints: &FetchHints) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource.path_segment());
        }
        {
            let mut query = url.query_pairs_mut();
            if let Some(page) = hints.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(term) = hints.search_term() {
                query.append_pair("search", term);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }

    async fn get_collection<T>(&self, url: Url) -> Result<CatalogResponse<T>, CatalogClientError>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(CatalogClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogClientError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: Value = response.json().await.map_err(|err| {
            if err.is_decode() {
                CatalogClientError::Shape(format!("body is not JSON: {err}"))
            } else {
                CatalogClientError::Transport(err)
            }
        })?;

        CatalogResponse::from_json(body)
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: GET requests against the public catalog via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
pub trait ClientTrait {
    /// Fetch the list endpoint of `resource`.
    ///
    /// Issues exactly one request, never retries and never caches.
    /// Fails with [`CatalogClientError::Cancelled`] if `cancel` fires first.
    fn fetch_collection<T>(
        &self,
        resource: Resource,
        hints: &FetchHints,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CatalogResponse<T>, CatalogClientError>> + Send
    where
        T: DeserializeOwned + Send;
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(resource = %resource))]
    async fn fetch_collection<T>(
        &self,
        resource: Resource,
        hints: &FetchHints,
        cancel: &CancellationToken,
    ) -> Result<CatalogResponse<T>, CatalogClientError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.collection_url(resource, hints);
        debug!(%url, "fetching catalog collection");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("catalog request cancelled");
                return Err(CatalogClientError::Cancelled);
            },
            response = self.get_collection::<T>(url) => response?,
        };

        debug!(
            count = response.count,
            n_results = response.results.len(),
            complete = response.is_complete(),
            "received catalog collection"
        );
        Ok(response)
    }
}

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

impl From<CatalogClient> for Client {
    fn from(client: CatalogClient) -> Self {
        Client::Catalog(client)
    }
}

impl From<MockClient> for Client {
    fn from(client: MockClient) -> Self {
        Client::Mock(client)
    }
}

impl ClientTrait for Client {
    async fn fetch_collection<T>(
        &self,
        resource: Resource,
        hints: &FetchHints,
        cancel: &CancellationToken,
    ) -> Result<CatalogResponse<T>, CatalogClientError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Client::Catalog(client) => client.fetch_collection(resource, hints, cancel).await,
            Client::Mock(client) => client.fetch_collection(resource, hints, cancel).await,
        }
    }
}

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("spacequest/{}", env!("CARGO_PKG_VERSION")));

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use httpmock::Method::GET;
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: url.to_string(),
            ..Default::default()
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
    }

    #[test]
    fn collection_url_has_no_trailing_slash() {
        let client = CatalogClient::new(client_config("https://swapi.info/api/")).unwrap();
        let url = client.collection_url(Resource::Starships, &FetchHints::default());
        assert_eq!(url.as_str(), "https://swapi.info/api/starships");
    }

    #[test]
    fn collection_url_carries_hints() {
        let client = CatalogClient::new(client_config("https://swapi.info/api")).unwrap();
        let url = client.collection_url(Resource::People, &FetchHints {
            page: Some(2),
            search: Some("  luke sky ".to_string()),
        });
        assert_eq!(
            url.as_str(),
            "https://swapi.info/api/people?page=2&search=luke+sky"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = CatalogClient::new(client_config("not a url")).unwrap_err();
        assert!(matches!(err, CatalogClientError::InvalidUrl { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn bare_array_is_normalized() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/people");
                then.status(200)
                    .json_body(json!([{"name": "Luke Skywalker"}, {"name": "C-3PO"}]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let response = client
            .fetch_collection::<Person>(
                Resource::People,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, CatalogResponse {
            count: 2,
            next: None,
            previous: None,
            results: vec![
                Person {
                    name: "Luke Skywalker".to_string()
                },
                Person {
                    name: "C-3PO".to_string()
                },
            ],
        });
    }

    #[tokio::test]
    async fn envelope_is_normalized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/planets");
                then.status(200).json_body(json!({
                    "count": 60,
                    "next": "https://swapi.dev/api/planets/?page=2",
                    "previous": null,
                    "results": [{"name": "Tatooine"}],
                }));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let response = client
            .fetch_collection::<Value>(
                Resource::Planets,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.count, 60);
        assert_eq!(response.results.len(), 1);
        assert!(!response.is_complete());
    }

    #[tokio::test]
    async fn hints_are_sent_as_query_parameters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/people")
                    .query_param("page", "1")
                    .query_param("search", "luke");
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let hints = FetchHints {
            page: Some(1),
            search: Some("luke".to_string()),
        };
        client
            .fetch_collection::<Value>(Resource::People, &hints, &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/films");
                then.status(500).body("<html>oops</html>");
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client
            .fetch_collection::<Value>(
                Resource::Films,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(
            matches!(&err, CatalogClientError::Http { status: 500, status_text } if status_text == "Internal Server Error"),
            "{err:?}"
        );
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "catalog request failed: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn unexpected_body_is_shape_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/species");
                then.status(200).json_body(json!({"detail": "nothing here"}));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client
            .fetch_collection::<Value>(
                Resource::Species,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogClientError::Shape(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_json_body_is_shape_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/vehicles");
                then.status(200).body("definitely not json");
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client
            .fetch_collection::<Value>(
                Resource::Vehicles,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogClientError::Shape(_)), "{err:?}");
    }

    #[tokio::test]
    async fn cancelled_request_is_cancelled_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/people");
                then.status(200)
                    .delay(Duration::from_secs(10))
                    .json_body(json!([]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            })
        };

        let err = client
            .fetch_collection::<Value>(Resource::People, &FetchHints::default(), &token)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled(), "{err:?}");
    }

    #[tokio::test]
    async fn already_cancelled_token_sends_nothing() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/people");
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = client
            .fetch_collection::<Value>(Resource::People, &FetchHints::default(), &token)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = format!("spacequest/{}", env!("CARGO_PKG_VERSION"));
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.header("user-agent", expected_agent);
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let _ = client
            .fetch_collection::<Value>(
                Resource::Films,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("spacequest-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.header("spacequest-test", "test-value");
                then.status(200).json_body(json!([]));
            })
            .await;

        let config = CatalogClientConfig {
            catalog_url: server.base_url(),
            extra_headers,
            ..Default::default()
        };
        let client = CatalogClient::new(config).unwrap();
        let _ = client
            .fetch_collection::<Value>(
                Resource::Films,
                &FetchHints::default(),
                &CancellationToken::new(),
            )
            .await;
        mock.assert_async().await;
    }
}
