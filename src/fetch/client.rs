//! reqwest-backed implementation of the [`Fetcher`] capability.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// Per-request overrides applied on top of the client defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// User-Agent header for this request only.
    pub user_agent: Option<String>,
    /// Total timeout for this request only.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options that send the given User-Agent.
    #[must_use]
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            timeout: None,
        }
    }

    /// Returns a copy with the request timeout set.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Fetches the full body of a URL.
///
/// A non-success status is reported as [`FetchError::HttpStatus`]; callers
/// that treat 404 as an expected gap check [`FetchError::is_not_found`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues one GET and returns the response body.
    async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<Vec<u8>, FetchError>;
}

/// Construction settings for [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Default total request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Proxy URL applied to every request.
    pub proxy: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

/// HTTP client shared by the live query path and the bulk archive path.
///
/// Create once and clone freely; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default timeouts and no proxy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::from_config(&HttpClientConfig::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the proxy URL is rejected or
    /// the underlying builder fails.
    #[instrument(level = "debug", fields(proxy = config.proxy.is_some()))]
    pub fn from_config(config: &HttpClientConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent());
        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy).map_err(|source| FetchError::ClientBuild { source })?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(skip(self, options), fields(url = %url))]
    async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(parsed);
        if let Some(ua) = &options.user_agent {
            request = request.header(USER_AGENT, ua);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        read_body(url, response).await
    }
}

/// Collects the response body into a buffer owned by the caller.
async fn read_body(url: &str, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
    let capacity = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut body = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_transport_error(url, e))?;
        body.extend_from_slice(&chunk);
    }

    debug!(bytes = body.len(), "body received");
    Ok(body)
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/file.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04payload".to_vec()))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/file.zip", mock_server.uri());
        let body = client.fetch(&url, &RequestOptions::default()).await.unwrap();

        assert_eq!(body, b"PK\x03\x04payload");
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_found() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/missing.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/missing.zip", mock_server.uri());
        let error = client
            .fetch(&url, &RequestOptions::default())
            .await
            .unwrap_err();

        assert!(error.is_not_found(), "Expected 404, got: {error:?}");
    }

    #[tokio::test]
    async fn test_fetch_500_is_http_status() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let error = client
            .fetch(&mock_server.uri(), &RequestOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent_override() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(header("user-agent", "TestBrowser/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let body = client
            .fetch(
                &mock_server.uri(),
                &RequestOptions::with_user_agent("TestBrowser/1.0"),
            )
            .await
            .unwrap();

        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_classified() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let options = RequestOptions::default().timeout(Duration::from_millis(100));
        let error = client.fetch(&mock_server.uri(), &options).await.unwrap_err();

        assert!(matches!(error, FetchError::Timeout { .. }), "got: {error:?}");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let client = HttpClient::new();
        let error = client
            .fetch("not-a-valid-url", &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl { .. }));
    }
}
