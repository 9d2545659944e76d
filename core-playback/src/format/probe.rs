//! Network probe for declared stream format.
//!
//! A probe is a single HEAD request with `icy-*` metadata requested. Its
//! outcome is evidence, never a verdict: any failure yields
//! `detected = false` and callers fall back to pattern matching.

use bridge_traits::{HttpClient, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::mime;
use crate::cache::{CacheStats, TtlCache};
use crate::types::{FormatKey, StreamMetadata};
use core_runtime::logging::redact_url;

/// Outcome of a header probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// `true` when a format could be derived from the content type
    pub detected: bool,
    pub format: Option<FormatKey>,
    /// Declared media type with parameters stripped
    pub mime_type: Option<String>,
    pub metadata: StreamMetadata,
    /// Why detection failed, if it did
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            detected: false,
            format: None,
            mime_type: None,
            metadata: StreamMetadata::default(),
            error: Some(error.into()),
        }
    }

    fn from_response(response: &HttpResponse) -> Self {
        let metadata = parse_icy_headers(response);

        if !response.is_success() {
            return Self {
                metadata,
                ..Self::failed(format!("HTTP {}", response.status))
            };
        }

        let Some(content_type) = response.content_type() else {
            return Self {
                metadata,
                ..Self::failed("response has no content type")
            };
        };

        let essence = mime::strip_parameters(content_type);
        match mime::format_for_content_type(content_type) {
            Some(format) => Self {
                detected: true,
                format: Some(format),
                mime_type: Some(essence),
                metadata,
                error: None,
            },
            None => Self {
                detected: false,
                format: None,
                mime_type: Some(essence.clone()),
                metadata,
                error: Some(format!("unrecognised content type {}", essence)),
            },
        }
    }
}

/// Extract station metadata from `icy-*` headers.
///
/// Values are parsed leniently: blanks become `None`, and a bitrate such as
/// `"128,128"` keeps its first figure.
pub fn parse_icy_headers(response: &HttpResponse) -> StreamMetadata {
    let text = |name: &str| {
        response
            .header(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let number = |name: &str| {
        response
            .header(name)
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<u32>().ok())
    };

    StreamMetadata {
        bitrate_kbps: number("icy-br"),
        name: text("icy-name"),
        genre: text("icy-genre"),
        description: text("icy-description"),
        url: text("icy-url"),
        sample_rate: number("icy-sr"),
    }
}

/// Issues header probes and caches successful results per URL.
pub struct FormatProbe {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
    cache: TtlCache<String, ProbeResult>,
}

impl FormatProbe {
    pub fn new(
        http: Arc<dyn HttpClient>,
        timeout: Duration,
        cache_capacity: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            http,
            timeout,
            cache: TtlCache::new("probe", cache_capacity, cache_ttl),
        }
    }

    /// Probe `url` with the configured timeout.
    pub async fn detect(&self, url: &str) -> ProbeResult {
        self.detect_with_timeout(url, self.timeout).await
    }

    /// Probe `url`, giving up after `timeout`.
    ///
    /// Only successful detections are cached, so a station that was briefly
    /// unreachable is probed again on the next selection.
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    pub async fn detect_with_timeout(&self, url: &str, timeout: Duration) -> ProbeResult {
        let key = url.to_string();
        if let Some(cached) = self.cache.get(&key) {
            debug!("Probe cache hit");
            return cached;
        }

        let request = HttpRequest::head(url).with_icy_metadata().timeout(timeout);
        let result = match tokio::time::timeout(timeout, self.http.execute(request)).await {
            Err(_) => ProbeResult::failed(format!("probe timed out after {:?}", timeout)),
            Ok(Err(e)) => ProbeResult::failed(e.to_string()),
            Ok(Ok(response)) => ProbeResult::from_response(&response),
        };

        if result.detected {
            debug!(format = ?result.format, "Probe detected format");
            self.cache.insert(key, result.clone());
        } else {
            debug!(error = ?result.error, "Probe gave no format evidence");
        }

        result
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, ByteStream, HttpMethod};
    use mockall::mock;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
            async fn download_stream(&self, url: String) -> bridge_traits::error::Result<ByteStream>;
            async fn is_connected(&self) -> bool;
        }
    }

    fn probe(http: MockHttp) -> FormatProbe {
        FormatProbe::new(
            Arc::new(http),
            Duration::from_secs(4),
            16,
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_detects_flac_with_metadata() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Head
                    && req.headers.get("Icy-MetaData").map(String::as_str) == Some("1")
                    && req.timeout == Some(Duration::from_secs(4))
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(200)
                    .with_header("Content-Type", "audio/flac; charset=binary")
                    .with_header("icy-br", "1411")
                    .with_header("icy-name", "Lossless Radio")
                    .with_header("icy-genre", " Classical "))
            });

        let result = probe(http).detect("https://radio.example/live").await;
        assert!(result.detected);
        assert_eq!(result.format, Some(FormatKey::Flac));
        assert_eq!(result.mime_type.as_deref(), Some("audio/flac"));
        assert_eq!(result.metadata.bitrate_kbps, Some(1411));
        assert_eq!(result.metadata.name.as_deref(), Some("Lossless Radio"));
        assert_eq!(result.metadata.genre.as_deref(), Some("Classical"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_successful_probe_is_cached() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200).with_header("content-type", "audio/mpeg")));

        let probe = probe(http);
        let first = probe.detect("https://radio.example/a").await;
        let second = probe.detect("https://radio.example/a").await;

        assert_eq!(first, second);
        let stats = probe.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.insertions, 1);
    }

    #[tokio::test]
    async fn test_network_failure_is_not_escalated_or_cached() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(2)
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".to_string())));

        let probe = probe(http);
        let result = probe.detect("https://radio.example/down").await;
        assert!(!result.detected);
        assert!(result.error.unwrap().contains("connection refused"));

        probe.detect("https://radio.example/down").await;
        assert_eq!(probe.cache_stats().insertions, 0);
    }

    #[tokio::test]
    async fn test_unrecognised_content_type() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(200).with_header("content-type", "text/html")));

        let result = probe(http).detect("https://radio.example/page").await;
        assert!(!result.detected);
        assert_eq!(result.mime_type.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(404).with_header("content-type", "audio/mpeg")));

        let result = probe(http).detect("https://radio.example/gone").await;
        assert!(!result.detected);
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
    }

    struct HangingClient;

    #[async_trait]
    impl HttpClient for HangingClient {
        async fn execute(&self, _request: HttpRequest) -> bridge_traits::error::Result<HttpResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(HttpResponse::new(200))
        }

        async fn download_stream(&self, _url: String) -> bridge_traits::error::Result<ByteStream> {
            Err(BridgeError::NotAvailable("unused".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_times_out() {
        let probe = FormatProbe::new(
            Arc::new(HangingClient),
            Duration::from_secs(4),
            16,
            Duration::from_secs(300),
        );

        let result = probe.detect("https://radio.example/slow").await;
        assert!(!result.detected);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[test]
    fn test_icy_parsing_is_lenient() {
        let response = HttpResponse::new(200)
            .with_header("icy-br", "128,128")
            .with_header("icy-sr", "not-a-number")
            .with_header("icy-description", "   ")
            .with_header("icy-url", "https://station.example");

        let metadata = parse_icy_headers(&response);
        assert_eq!(metadata.bitrate_kbps, Some(128));
        assert_eq!(metadata.sample_rate, None);
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.url.as_deref(), Some("https://station.example"));
    }

    #[test]
    fn test_malformed_bitrate_is_none() {
        let response = HttpResponse::new(200).with_header("icy-br", "fast");
        assert_eq!(parse_icy_headers(&response).bitrate_kbps, None);
    }
}
