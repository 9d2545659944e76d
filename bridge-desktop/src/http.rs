//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Reqwest-based HTTP client implementation
///
/// Provides:
/// - Connection pooling via reqwest
/// - HEAD probing with per-request timeouts
/// - Chunked streaming of live bodies
///
/// No retries are performed here; the playback controller owns retry policy.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a new HTTP client with a custom connect timeout
    ///
    /// No overall request timeout is set on the client because streamed
    /// radio bodies are unbounded. Per-request timeouts come from
    /// [`HttpRequest::timeout`].
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("airwave/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn map_error(error: reqwest::Error, timeout: Option<Duration>) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(timeout.unwrap_or_default())
        } else if error.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", error))
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|s| (k.as_str().to_ascii_lowercase(), s.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, "Executing HTTP request");

        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request failed");
                Self::map_error(e, request.timeout)
            })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(response.headers());

        // HEAD responses have no body; reading one from a live GET would never end.
        let body = if request.method == HttpMethod::Head {
            bytes::Bytes::new()
        } else {
            response
                .bytes()
                .await
                .map_err(|e| Self::map_error(e, request.timeout))?
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn download_stream(&self, url: String) -> Result<ByteStream> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_error(e, None))?;

        if !response.status().is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| BridgeError::OperationFailed(format!("Stream read failed: {}", e)))
            .boxed();

        Ok(stream)
    }
}
