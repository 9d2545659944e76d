//! Strategy selection and the buffered-source feed.

use bridge_traits::{AudioSink, HttpClient, MediaSourceBuffer};
use futures::StreamExt;
use tracing::debug;

use crate::codec::ModuleKey;
use crate::error::{PlaybackError, Result};
use crate::types::{FormatKey, Strategy};

/// Pick how the sink should be fed.
///
/// Native formats always go direct. Other formats use the buffered source
/// when a codec module is available, the feature is enabled and the sink
/// supports the media type; otherwise they go direct and the sink may
/// reject them itself.
pub fn select_strategy(
    format: FormatKey,
    module: Option<ModuleKey>,
    sink: &dyn AudioSink,
    media_source_enabled: bool,
) -> Strategy {
    if format.is_native() || !media_source_enabled || module.is_none() {
        return Strategy::Direct;
    }

    if sink.supports_media_source(format.mime_type()) {
        Strategy::MediaSource
    } else {
        Strategy::Direct
    }
}

/// Stream `url` into `buffer` until the network read completes.
///
/// A chunk is only appended once the previous update has finished. The
/// buffer is closed with end-of-stream when the body ends.
pub async fn feed_media_source(
    http: &dyn HttpClient,
    buffer: &dyn MediaSourceBuffer,
    url: &str,
) -> Result<u64> {
    let mut stream = http.download_stream(url.to_string()).await?;
    let mut appended = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }

        if buffer.is_updating() {
            buffer.update_end().await;
        }

        appended += chunk.len() as u64;
        buffer.append(chunk).map_err(PlaybackError::MediaSource)?;
    }

    if buffer.is_updating() {
        buffer.update_end().await;
    }
    buffer.end_of_stream().map_err(PlaybackError::MediaSource)?;

    debug!(bytes = appended, "Buffered source feed complete");
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        error::Result as BridgeResult, BridgeError, ByteStream, HttpRequest, HttpResponse,
        SinkError, SinkEvent,
    };
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    struct CapabilitySink {
        media_source: bool,
    }

    #[async_trait]
    impl AudioSink for CapabilitySink {
        fn set_source(&self, _url: &str) {}
        fn clear_source(&self) {}
        fn load(&self) {}
        async fn play(&self) -> std::result::Result<(), SinkError> {
            Ok(())
        }
        fn pause(&self) {}
        fn can_play_type(&self, _mime_type: &str) -> bool {
            false
        }
        fn supports_media_source(&self, _mime_type: &str) -> bool {
            self.media_source
        }
        fn open_media_source(
            &self,
            _mime_type: &str,
        ) -> std::result::Result<Arc<dyn MediaSourceBuffer>, SinkError> {
            Err(SinkError::thrown("NotSupportedError", "unused"))
        }
        fn buffered_end(&self) -> Option<f64> {
            None
        }
        fn position(&self) -> f64 {
            0.0
        }
        fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
            broadcast::channel(1).1
        }
    }

    #[test]
    fn test_native_formats_go_direct() {
        let sink = CapabilitySink { media_source: true };
        assert_eq!(
            select_strategy(FormatKey::Mp3, None, &sink, true),
            Strategy::Direct
        );
        assert_eq!(
            select_strategy(FormatKey::Aac, Some(ModuleKey::MediaSource), &sink, true),
            Strategy::Direct
        );
    }

    #[test]
    fn test_enhanced_formats_prefer_media_source() {
        let sink = CapabilitySink { media_source: true };
        assert_eq!(
            select_strategy(FormatKey::Flac, Some(ModuleKey::Flac), &sink, true),
            Strategy::MediaSource
        );
    }

    #[test]
    fn test_falls_back_to_direct() {
        let unsupported = CapabilitySink { media_source: false };
        let supported = CapabilitySink { media_source: true };

        assert_eq!(
            select_strategy(FormatKey::Opus, Some(ModuleKey::Opus), &unsupported, true),
            Strategy::Direct
        );
        // Chain exhausted.
        assert_eq!(
            select_strategy(FormatKey::Flac, None, &supported, true),
            Strategy::Direct
        );
        // Feature disabled.
        assert_eq!(
            select_strategy(FormatKey::Hls, Some(ModuleKey::Hls), &supported, false),
            Strategy::Direct
        );
    }

    /// Buffer that stays "updating" after each append until `update_end`.
    #[derive(Default)]
    struct StrictBuffer {
        updating: AtomicBool,
        chunks: Mutex<Vec<Bytes>>,
        overlapped: AtomicBool,
        ended: AtomicBool,
        fail_append: bool,
    }

    #[async_trait]
    impl MediaSourceBuffer for StrictBuffer {
        fn is_updating(&self) -> bool {
            self.updating.load(Ordering::SeqCst)
        }
        fn append(&self, chunk: Bytes) -> std::result::Result<(), SinkError> {
            if self.fail_append {
                return Err(SinkError::thrown("QuotaExceededError", "buffer full"));
            }
            if self.updating.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.chunks.lock().push(chunk);
            Ok(())
        }
        async fn update_end(&self) {
            tokio::task::yield_now().await;
            self.updating.store(false, Ordering::SeqCst);
        }
        fn end_of_stream(&self) -> std::result::Result<(), SinkError> {
            self.ended.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn abort(&self) {}
    }

    struct ChunkedHttp {
        chunks: Vec<&'static str>,
        fail_connect: bool,
    }

    #[async_trait]
    impl HttpClient for ChunkedHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200))
        }

        async fn download_stream(&self, _url: String) -> BridgeResult<ByteStream> {
            if self.fail_connect {
                return Err(BridgeError::OperationFailed("refused".to_string()));
            }
            let items: Vec<BridgeResult<Bytes>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            Ok(futures::stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn test_feed_respects_backpressure() {
        let http = ChunkedHttp {
            chunks: vec!["abc", "", "defg", "h"],
            fail_connect: false,
        };
        let buffer = StrictBuffer::default();

        let bytes = feed_media_source(&http, &buffer, "https://r.example/live.flac")
            .await
            .unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(buffer.chunks.lock().len(), 3);
        assert!(!buffer.overlapped.load(Ordering::SeqCst));
        assert!(buffer.ended.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_append_error_aborts_feed() {
        let http = ChunkedHttp {
            chunks: vec!["abc"],
            fail_connect: false,
        };
        let buffer = StrictBuffer {
            fail_append: true,
            ..Default::default()
        };

        let err = feed_media_source(&http, &buffer, "u").await.unwrap_err();
        assert!(matches!(err, PlaybackError::MediaSource(_)));
        assert!(!buffer.ended.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connect_error_propagates() {
        let http = ChunkedHttp {
            chunks: vec![],
            fail_connect: true,
        };
        let buffer = StrictBuffer::default();

        let err = feed_media_source(&http, &buffer, "u").await.unwrap_err();
        assert!(matches!(err, PlaybackError::Bridge(_)));
    }
}
