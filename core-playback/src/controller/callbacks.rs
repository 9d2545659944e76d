//! Outward notification surface.

use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;

use super::state::PlaybackState;
use crate::error::ErrorClass;
use crate::types::{QualityLevel, StreamDescriptor};

/// Host callbacks. Every method defaults to a no-op.
///
/// Callbacks run on the engine's tasks with no internal lock held, so they
/// may call back into the controller.
pub trait PlaybackCallbacks: Send + Sync {
    /// Terminal failure for the current station.
    fn on_error(&self, _message: &str, _raw_error: &str, _station: &StreamDescriptor) {}

    /// A retryable failure; attempt `attempt` of `max_retries` just failed.
    fn on_retry(&self, _attempt: u32, _max_retries: u32, _station: &StreamDescriptor) {}

    fn on_buffering_change(&self, _is_buffering: bool, _reason: &str) {}

    fn on_quality_change(&self, _level: QualityLevel, _buffer_health: f64) {}

    fn on_station_loading(&self, _name: &str) {}

    /// First successful start for a selection. Never fires for a selection
    /// that was superseded.
    fn on_station_loaded(&self, _name: &str) {}

    fn on_state_change(&self, _from: PlaybackState, _to: PlaybackState) {}
}

/// Callbacks that ignore everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl PlaybackCallbacks for NoopCallbacks {}

/// Fans every notification out to the callbacks and the event bus.
#[derive(Clone)]
pub(crate) struct Notifier {
    callbacks: Arc<dyn PlaybackCallbacks>,
    events: EventBus,
}

impl Notifier {
    pub(crate) fn new(callbacks: Arc<dyn PlaybackCallbacks>, events: EventBus) -> Self {
        Self { callbacks, events }
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        self.events.emit(CoreEvent::Playback(event)).ok();
    }

    pub(crate) fn state_changed(&self, from: PlaybackState, to: PlaybackState, generation: u64) {
        self.callbacks.on_state_change(from, to);
        self.emit(PlaybackEvent::StateChanged {
            from: from.to_string(),
            to: to.to_string(),
            generation,
        });
    }

    pub(crate) fn station_loading(&self, station: &StreamDescriptor) {
        self.callbacks.on_station_loading(&station.name);
        self.emit(PlaybackEvent::StationLoading {
            station: station.name.clone(),
            url: core_runtime::logging::redact_url(&station.url),
        });
    }

    pub(crate) fn station_loaded(&self, station: &StreamDescriptor) {
        self.callbacks.on_station_loaded(&station.name);
        self.emit(PlaybackEvent::StationLoaded {
            station: station.name.clone(),
        });
    }

    pub(crate) fn retrying(&self, attempt: u32, max_retries: u32, station: &StreamDescriptor) {
        self.callbacks.on_retry(attempt, max_retries, station);
        self.emit(PlaybackEvent::Retrying {
            station: station.name.clone(),
            attempt,
            max_attempts: max_retries,
        });
    }

    pub(crate) fn error(&self, class: ErrorClass, raw_error: &str, station: &StreamDescriptor) {
        let message = class.user_message();
        self.callbacks.on_error(message, raw_error, station);
        self.emit(PlaybackEvent::Error {
            station: Some(station.name.clone()),
            class: class.to_string(),
            message: message.to_string(),
            raw: raw_error.to_string(),
            recoverable: class.is_retryable(),
        });
    }

    pub(crate) fn buffering(&self, station: &StreamDescriptor, is_buffering: bool, reason: &str) {
        self.callbacks.on_buffering_change(is_buffering, reason);
        self.emit(PlaybackEvent::BufferingChanged {
            station: station.name.clone(),
            buffering: is_buffering,
        });
    }

    pub(crate) fn quality(&self, station: &StreamDescriptor, level: QualityLevel, health: f64) {
        self.callbacks.on_quality_change(level, health);
        self.emit(PlaybackEvent::QualityChanged {
            station: station.name.clone(),
            quality: level.to_string(),
            health_secs: health,
        });
    }
}
