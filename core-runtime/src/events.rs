//! # Event Bus System
//!
//! Event-driven notification layer for the stream engine, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums for playback and codec notifications
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! Every callback the playback controller fires is mirrored here, so hosts
//! can choose between the callback trait and a subscription.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  emit   ┌───────────┐
//! │ PlaybackController ├────────>│           │  subscribe  ┌────────────┐
//! └────────────────────┘         │ EventBus  ├────────────>│ Subscriber │
//! ┌────────────────────┐  emit   │ (broadcast│             └────────────┘
//! │ CodecRegistry      ├────────>│  channel) │
//! └────────────────────┘         └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut errors = EventStream::new(event_bus.subscribe())
//!     .filter(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::Error { .. })));
//!
//! event_bus.emit(CoreEvent::Playback(PlaybackEvent::StationLoaded {
//!     station: "Jazz FM".to_string(),
//! })).ok();
//! # }
//! ```
//!
//! Emitting with no subscribers returns an error from [`EventBus::emit`];
//! publishers inside the engine ignore it.

use crate::config::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError, Receiver};

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Station lifecycle and playback health
    Playback(PlaybackEvent),
    /// Codec module loading and fallback resolution
    Codec(CodecEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Codec(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Retrying { .. })
            | CoreEvent::Codec(CodecEvent::ModuleLoadFailed { .. })
            | CoreEvent::Codec(CodecEvent::ChainExhausted { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::StationLoaded { .. })
            | CoreEvent::Codec(CodecEvent::ModuleLoaded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to station playback.
///
/// State and quality names are carried as lowercase strings so this crate
/// stays independent of the engine's types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A station was selected and resolution has begun.
    StationLoading { station: String, url: String },
    /// First successful playback start for the current selection.
    StationLoaded { station: String },
    /// The playback state machine moved.
    StateChanged {
        from: String,
        to: String,
        /// Selection generation the transition belongs to
        generation: u64,
    },
    /// A retryable failure scheduled another attempt.
    Retrying {
        station: String,
        /// Number of the attempt that just failed
        attempt: u32,
        max_attempts: u32,
    },
    /// Terminal failure for the current selection.
    Error {
        station: Option<String>,
        /// Error class name (e.g. "network", "cors")
        class: String,
        /// User-facing message
        message: String,
        /// Raw sink error text
        raw: String,
        recoverable: bool,
    },
    /// Playback stalled or recovered from a stall.
    BufferingChanged { station: String, buffering: bool },
    /// Buffer health crossed a quality threshold.
    QualityChanged {
        station: String,
        quality: String,
        /// Seconds of audio buffered ahead of the playhead
        health_secs: f64,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StationLoading { .. } => "Station loading",
            PlaybackEvent::StationLoaded { .. } => "Station loaded",
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::Retrying { .. } => "Retrying playback",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::BufferingChanged { .. } => "Buffering changed",
            PlaybackEvent::QualityChanged { .. } => "Stream quality changed",
        }
    }
}

// ============================================================================
// Codec Events
// ============================================================================

/// Events related to codec module loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CodecEvent {
    ModuleLoaded { module: String },
    ModuleLoadFailed { module: String, error: String },
    /// The first module of a chain failed and a later one was chosen.
    FallbackUsed { original: String, chosen: String },
    /// Every module in a chain failed; playback continues on the direct path.
    ChainExhausted {
        format: String,
        attempted: Vec<String>,
    },
}

impl CodecEvent {
    fn description(&self) -> &str {
        match self {
            CodecEvent::ModuleLoaded { .. } => "Codec module loaded",
            CodecEvent::ModuleLoadFailed { .. } => "Codec module failed to load",
            CodecEvent::FallbackUsed { .. } => "Codec fallback used",
            CodecEvent::ChainExhausted { .. } => "Codec fallback chain exhausted",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
