//! # Playback Error Types
//!
//! Error taxonomy for station playback, plus the fixed classification of
//! sink failures that drives the retry policy.

use bridge_traits::{media_error, BridgeError, SinkError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::codec::ModuleKey;
use crate::types::FormatKey;

/// Classified cause of a playback failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    Network,
    Aborted,
    Decode,
    Unsupported,
    NotAllowed,
    Cors,
    Codec,
    Unknown,
}

impl ErrorClass {
    /// Map a sink media error code (1 to 4) to its class.
    pub fn from_sink_code(code: u16) -> Option<Self> {
        match code {
            media_error::ABORTED => Some(ErrorClass::Aborted),
            media_error::NETWORK => Some(ErrorClass::Network),
            media_error::DECODE => Some(ErrorClass::Decode),
            media_error::SRC_NOT_SUPPORTED => Some(ErrorClass::Unsupported),
            _ => None,
        }
    }

    /// Classify a sink error.
    ///
    /// A known media error code wins. Otherwise the exception name and
    /// message are matched against fixed substrings; anything unmatched is
    /// [`ErrorClass::Unknown`].
    pub fn classify(error: &SinkError) -> Self {
        if let Some(class) = error.code.and_then(Self::from_sink_code) {
            return class;
        }

        let name = error.name.as_str();
        let message = error.message.to_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

        if name == "NotAllowedError" || mentions(&["not allowed", "user gesture", "autoplay"]) {
            ErrorClass::NotAllowed
        } else if mentions(&["cors", "cross-origin", "access-control"]) {
            ErrorClass::Cors
        } else if name == "NotSupportedError" || mentions(&["codec", "no supported source"]) {
            ErrorClass::Codec
        } else if name == "AbortError" {
            ErrorClass::Aborted
        } else {
            ErrorClass::Unknown
        }
    }

    /// Only transient transport failures are retried.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Network | ErrorClass::Aborted)
    }

    /// Fixed, user-facing message for this class.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorClass::Network => {
                "Network error while streaming this station. Check your connection and try again."
            }
            ErrorClass::Aborted => "Loading the stream was interrupted.",
            ErrorClass::Decode => "The station sent audio data that could not be decoded.",
            ErrorClass::Unsupported => "This station's stream format is not supported here.",
            ErrorClass::NotAllowed => "Playback was blocked. Press play to start listening.",
            ErrorClass::Cors => {
                "This station does not allow playback from this app. The problem is on the \
                 station's side, not your setup. Please choose another station."
            }
            ErrorClass::Codec => "The decoder this station needs could not be loaded.",
            ErrorClass::Unknown => "Something went wrong while playing this station.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Network => "network",
            ErrorClass::Aborted => "aborted",
            ErrorClass::Decode => "decode",
            ErrorClass::Unsupported => "unsupported",
            ErrorClass::NotAllowed => "not-allowed",
            ErrorClass::Cors => "cors",
            ErrorClass::Codec => "codec",
            ErrorClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while resolving or playing a station.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The sink reported an error event or rejected `play()`.
    #[error("Sink error ({class}): {source}")]
    Sink {
        class: ErrorClass,
        #[source]
        source: SinkError,
    },

    /// `play()` did not settle within the load ceiling.
    #[error("Playback did not start within {0:?}")]
    StartTimeout(Duration),

    /// A live stream reported the end of its data.
    #[error("Stream ended unexpectedly")]
    StreamEnded,

    #[error("Codec module {module} failed to load: {reason}")]
    ModuleLoad { module: ModuleKey, reason: String },

    /// Every module in a fallback chain failed to load.
    #[error("No codec module available for {format} (tried {attempted:?})")]
    FallbackExhausted {
        format: FormatKey,
        attempted: Vec<ModuleKey>,
    },

    /// Buffered-source construction or append failed.
    #[error("Media source error: {0}")]
    MediaSource(SinkError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Wrap a sink error with its classification.
    pub fn from_sink(source: SinkError) -> Self {
        PlaybackError::Sink {
            class: ErrorClass::classify(&source),
            source,
        }
    }

    /// Class of this error in the playback taxonomy.
    pub fn class(&self) -> ErrorClass {
        match self {
            PlaybackError::Sink { class, .. } => *class,
            PlaybackError::StartTimeout(_)
            | PlaybackError::StreamEnded
            | PlaybackError::Bridge(_) => ErrorClass::Network,
            PlaybackError::ModuleLoad { .. } | PlaybackError::FallbackExhausted { .. } => {
                ErrorClass::Codec
            }
            PlaybackError::MediaSource(source) => ErrorClass::classify(source),
            PlaybackError::Config(_) | PlaybackError::Runtime(_) => ErrorClass::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
