//! HTTP Client Abstraction
//!
//! Provides HEAD-style probing and cancellable chunked reads for live streams.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// Stream of body chunks. Dropping the stream cancels the underlying read.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Shorthand for a HEAD request, the usual way of probing a stream.
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, url)
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Ask Shoutcast/Icecast servers to include `icy-*` metadata headers.
    pub fn with_icy_metadata(self) -> Self {
        self.header("Icy-MetaData", "1")
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw `Content-Type` value, parameters included.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP client trait
///
/// Implementations must honour [`HttpRequest::timeout`] and must not retry on
/// their own; retry policy belongs to the playback controller.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn content_type(client: &dyn HttpClient, url: &str) -> Option<String> {
///     let response = client.execute(HttpRequest::head(url)).await.ok()?;
///     response.content_type().map(str::to_string)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and buffer the whole response.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Open a streamed GET and yield body chunks as they arrive.
    ///
    /// Live radio bodies never end on their own, so callers are expected to
    /// drop the stream when they are done with it.
    async fn download_stream(&self, url: String) -> Result<ByteStream>;

    /// Check network connectivity
    async fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::head("https://radio.example.com/live")
            .header("User-Agent", "test")
            .with_icy_metadata()
            .timeout(Duration::from_secs(4));

        assert_eq!(request.method, HttpMethod::Head);
        assert_eq!(request.url, "https://radio.example.com/live");
        assert_eq!(request.headers.get("Icy-MetaData"), Some(&"1".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_response_headers_are_case_insensitive() {
        let response = HttpResponse::new(200)
            .with_header("Content-Type", "audio/mpeg; charset=utf-8")
            .with_header("ICY-BR", "128");

        assert_eq!(response.content_type(), Some("audio/mpeg; charset=utf-8"));
        assert_eq!(response.header("icy-br"), Some("128"));
        assert_eq!(response.header("Icy-Br"), Some("128"));
        assert!(response.header("icy-name").is_none());
    }

    #[test]
    fn test_http_response_status_checks() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(404).is_success());
        assert!(!HttpResponse::new(503).is_success());
    }
}
