//! Audio sink bridge traits.
//!
//! The core never decodes audio itself. It hands a URL (or a manually fed
//! buffered source) to a host-owned sink and reacts to the events the sink
//! reports back. These traits describe that contract without tying the core
//! to a concrete media element or audio backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Media error codes reported by sinks.
pub mod media_error {
    /// Fetching was aborted by the user agent.
    pub const ABORTED: u16 = 1;
    /// A network error interrupted fetching.
    pub const NETWORK: u16 = 2;
    /// The media could not be decoded.
    pub const DECODE: u16 = 3;
    /// The source format is not supported.
    pub const SRC_NOT_SUPPORTED: u16 = 4;
}

/// Error reported by a sink, either through an `error` event or by a
/// rejected `play()` call.
///
/// `code` is set for media errors (see [`media_error`]). Rejected calls carry
/// an exception-style `name` such as `NotAllowedError` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct SinkError {
    pub code: Option<u16>,
    pub name: String,
    pub message: String,
}

impl SinkError {
    /// Error carried by an `error` event.
    pub fn media(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            name: "MediaError".to_string(),
            message: message.into(),
        }
    }

    /// Error thrown by a sink call.
    pub fn thrown(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: None,
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Events emitted by an [`AudioSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    LoadStart,
    LoadedData,
    CanPlay,
    Waiting,
    Stalled,
    Playing,
    Error(SinkError),
    Ended,
}

impl SinkEvent {
    /// Event name as a media element would report it.
    pub fn name(&self) -> &'static str {
        match self {
            SinkEvent::LoadStart => "loadstart",
            SinkEvent::LoadedData => "loadeddata",
            SinkEvent::CanPlay => "canplay",
            SinkEvent::Waiting => "waiting",
            SinkEvent::Stalled => "stalled",
            SinkEvent::Playing => "playing",
            SinkEvent::Error(_) => "error",
            SinkEvent::Ended => "ended",
        }
    }

    /// `true` once the sink has enough data to start playback.
    pub fn has_sufficient_data(&self) -> bool {
        matches!(self, SinkEvent::LoadedData | SinkEvent::CanPlay)
    }
}

/// A buffered source fed manually with compressed bytes.
///
/// Appends are asynchronous on the sink side: after [`append`](Self::append)
/// the buffer reports [`is_updating`](Self::is_updating) until it signals
/// update completion. Appending while an update is in flight is an error.
#[async_trait]
pub trait MediaSourceBuffer: Send + Sync {
    /// `true` while a previous append is still being processed.
    fn is_updating(&self) -> bool;

    /// Queue a chunk of compressed audio.
    fn append(&self, chunk: Bytes) -> Result<(), SinkError>;

    /// Resolve once the in-flight update (if any) has completed.
    async fn update_end(&self);

    /// Signal that no more data will be appended.
    fn end_of_stream(&self) -> Result<(), SinkError>;

    /// Drop any pending data and detach from the sink.
    fn abort(&self);
}

/// Host playback sink.
///
/// Exactly one sink is shared by the whole engine. The controller guarantees
/// that only the current playback generation drives it, and that the decode
/// graph is disconnected before a new one is connected.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Point the sink at a URL it will fetch and decode itself.
    fn set_source(&self, url: &str);

    /// Detach the current source, if any.
    fn clear_source(&self);

    /// Restart fetching of the current source.
    fn load(&self);

    /// Start playback. Resolves once the sink has accepted or rejected it.
    async fn play(&self) -> Result<(), SinkError>;

    fn pause(&self);

    /// `true` if the sink can decode `mime_type` natively from a URL.
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// `true` if the runtime supports a manually fed buffered source for
    /// `mime_type`.
    fn supports_media_source(&self, mime_type: &str) -> bool;

    /// Create a buffered source for `mime_type` and attach it as the sink's
    /// source.
    fn open_media_source(&self, mime_type: &str) -> Result<Arc<dyn MediaSourceBuffer>, SinkError>;

    /// Wire the filter chain and analysis node behind the sink.
    fn connect_graph(&self) {}

    /// Tear down the filter chain and analysis node.
    fn disconnect_graph(&self) {}

    /// End of the buffered range that contains the playback position, in seconds.
    fn buffered_end(&self) -> Option<f64>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Subscribe to sink events.
    fn subscribe(&self) -> broadcast::Receiver<SinkEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_constructors() {
        let media = SinkError::media(media_error::NETWORK, "connection reset");
        assert_eq!(media.code, Some(2));
        assert_eq!(media.to_string(), "MediaError: connection reset");

        let thrown = SinkError::thrown("NotAllowedError", "play() requires a user gesture");
        assert_eq!(thrown.code, None);
        assert_eq!(thrown.name, "NotAllowedError");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(SinkEvent::CanPlay.name(), "canplay");
        assert_eq!(SinkEvent::Error(SinkError::media(3, "bad")).name(), "error");
        assert!(SinkEvent::LoadedData.has_sufficient_data());
        assert!(SinkEvent::CanPlay.has_sufficient_data());
        assert!(!SinkEvent::Waiting.has_sufficient_data());
    }
}
