//! # Playback Controller
//!
//! Drives the shared [`AudioSink`] through the playback state machine.
//!
//! ## Generations
//!
//! Every station selection starts a new *generation*. Each task spawned for a
//! generation (sink event pump, load timer, `play()` waiter, backoff timer,
//! buffered-source feed, health sampler) captures the generation it belongs
//! to and re-checks it under the state lock before touching anything. A
//! superseded task therefore becomes a no-op, and the generation's
//! cancellation token lets it exit early instead of waiting for its next
//! wake-up.
//!
//! Within a generation a second counter, the *load sequence*, is bumped every
//! time the sink is (re)loaded. Timers and `play()` waiters also capture it,
//! so a timer armed for attempt 1 cannot fire into attempt 2.
//!
//! ## Locking
//!
//! The state lock is never held across an `.await`, a sink call or a
//! callback. Transitions are decided under the lock and announced after it
//! is released.
//!
//! Sink rewiring (teardown, graph connect, source swap, reload) happens under
//! a separate reentrant *wiring guard*. A generation re-checks that it is
//! still current while holding the guard, so a superseded selection can
//! never touch the sink after its successor has claimed it. The guard is
//! reentrant because callbacks fired while it is held may call
//! [`PlaybackController::stop`].

mod callbacks;
mod state;
mod strategy;

pub use callbacks::{NoopCallbacks, PlaybackCallbacks};
pub(crate) use callbacks::Notifier;
pub use state::PlaybackState;
pub use strategy::{feed_media_source, select_strategy};

use bridge_traits::{AudioSink, Clock, HttpClient, MediaSourceBuffer, SinkEvent};
use core_runtime::config::FeatureFlags;
use core_runtime::events::EventBus;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::codec::CodecModuleRegistry;
use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::format::FormatResolver;
use crate::health::{BufferHealthMonitor, BufferSample};
use crate::types::{FormatKey, PlaybackAttempt, StreamDescriptor, Strategy};
use core_runtime::logging::redact_url;

/// Collaborators a controller is built from.
pub struct ControllerDeps {
    pub sink: Arc<dyn AudioSink>,
    pub http: Arc<dyn HttpClient>,
    pub resolver: Arc<FormatResolver>,
    pub registry: Arc<CodecModuleRegistry>,
    pub callbacks: Arc<dyn PlaybackCallbacks>,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
}

/// A decided state change, announced once the lock is released.
#[derive(Debug, Clone, Copy)]
struct Transition {
    from: PlaybackState,
    to: PlaybackState,
    generation: u64,
}

/// Resources released when a generation is superseded.
struct Teardown {
    from: PlaybackState,
    media_source: Option<Arc<dyn MediaSourceBuffer>>,
    graph_connected: bool,
}

struct ControllerState {
    generation: u64,
    phase: PlaybackState,
    station: Option<StreamDescriptor>,
    attempt: Option<PlaybackAttempt>,
    cancel: CancellationToken,
    load_seq: u64,
    /// `on_station_loaded` already fired for this generation
    station_loaded: bool,
    graph_connected: bool,
    sampler_running: bool,
    monitor: BufferHealthMonitor,
    media_source: Option<Arc<dyn MediaSourceBuffer>>,
}

impl ControllerState {
    fn new(monitor: BufferHealthMonitor) -> Self {
        Self {
            generation: 0,
            phase: PlaybackState::Idle,
            station: None,
            attempt: None,
            cancel: CancellationToken::new(),
            load_seq: 0,
            station_loaded: false,
            graph_connected: false,
            sampler_running: false,
            monitor,
            media_source: None,
        }
    }

    /// Start a new generation in `phase`, cancelling everything the previous
    /// one scheduled.
    fn supersede(&mut self, phase: PlaybackState, station: Option<StreamDescriptor>) -> Teardown {
        self.generation += 1;
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        let from = self.phase;
        self.phase = phase;
        self.station = station;
        self.attempt = None;
        self.load_seq = 0;
        self.station_loaded = false;
        self.sampler_running = false;
        self.monitor.reset();

        Teardown {
            from,
            media_source: self.media_source.take(),
            graph_connected: std::mem::take(&mut self.graph_connected),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn transition(&mut self, to: PlaybackState) -> Option<Transition> {
        let from = self.phase;
        if from == to {
            return None;
        }
        if !from.can_transition_to(to) {
            warn!(%from, %to, "Ignoring illegal playback transition");
            return None;
        }

        self.phase = to;
        Some(Transition {
            from,
            to,
            generation: self.generation,
        })
    }
}

/// Outcome of a failure decided under the lock.
enum FailureAction {
    Retry {
        transition: Option<Transition>,
        station: StreamDescriptor,
        attempt: u32,
        seq: u64,
        token: CancellationToken,
    },
    Fail {
        transition: Option<Transition>,
        station: StreamDescriptor,
        media_source: Option<Arc<dyn MediaSourceBuffer>>,
    },
}

struct Inner {
    sink: Arc<dyn AudioSink>,
    http: Arc<dyn HttpClient>,
    resolver: Arc<FormatResolver>,
    registry: Arc<CodecModuleRegistry>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    config: PlaybackConfig,
    features: FeatureFlags,
    state: Mutex<ControllerState>,
    wiring: ReentrantMutex<()>,
}

/// Plays one station at a time on the shared sink.
///
/// Cloning is cheap; clones drive the same state machine.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    pub fn new(deps: ControllerDeps, config: PlaybackConfig, features: FeatureFlags) -> Self {
        let monitor = BufferHealthMonitor::new(config.poor_health_secs, config.good_health_secs);
        Self {
            inner: Arc::new(Inner {
                sink: deps.sink,
                http: deps.http,
                resolver: deps.resolver,
                registry: deps.registry,
                notifier: Notifier::new(deps.callbacks, deps.events),
                clock: deps.clock,
                config,
                features,
                state: Mutex::new(ControllerState::new(monitor)),
                wiring: ReentrantMutex::new(()),
            }),
        }
    }

    /// Select `station`, superseding whatever was playing.
    ///
    /// Returns once the format is resolved and the sink has been pointed at
    /// the stream; the rest of the lifecycle is reported through callbacks.
    /// Returns the generation assigned to this selection.
    #[instrument(skip(self, station), fields(station = %station.name, url = %redact_url(&station.url)))]
    pub async fn play_station(&self, station: StreamDescriptor) -> u64 {
        let inner = &self.inner;

        let (generation, from) = {
            let _wiring = inner.wiring.lock();
            let (generation, teardown) = {
                let mut state = inner.state.lock();
                let teardown = state.supersede(PlaybackState::Probing, Some(station.clone()));
                (state.generation, teardown)
            };
            let from = teardown.from;
            inner.release(teardown);
            (generation, from)
        };

        if from != PlaybackState::Idle {
            inner.announce(Some(Transition {
                from,
                to: PlaybackState::Idle,
                generation,
            }));
        }
        inner.announce(Some(Transition {
            from: PlaybackState::Idle,
            to: PlaybackState::Probing,
            generation,
        }));
        info!(generation, "Station selected");
        inner.notifier.station_loading(&station);

        let detection = inner
            .resolver
            .resolve(&station.url, station.declared_quality.as_deref())
            .await;
        if !inner.is_current(generation) {
            debug!(generation, "Selection superseded during format resolution");
            return generation;
        }

        let module = match inner.registry.resolve_with_fallback(detection.format).await {
            Ok(resolved) => resolved.chosen,
            Err(e) => {
                warn!(error = %e, "No codec module available, attempting direct playback");
                None
            }
        };

        let strategy = select_strategy(
            detection.format,
            module,
            inner.sink.as_ref(),
            inner.features.enable_media_source,
        );

        let _wiring = inner.wiring.lock();
        let (transition, seq, token) = {
            let mut state = inner.state.lock();
            if !state.is_current(generation) {
                debug!(generation, "Selection superseded during module resolution");
                return generation;
            }

            state.attempt = Some(PlaybackAttempt {
                station: station.clone(),
                generation,
                format: detection.format,
                codec: module,
                strategy,
                attempt_number: 1,
                started_at: inner.clock.now(),
            });
            state.load_seq += 1;
            state.graph_connected = true;
            let transition = state.transition(PlaybackState::Loading);
            (transition, state.load_seq, state.cancel.clone())
        };

        info!(
            format = %detection.format,
            confidence = %detection.confidence,
            codec = ?module,
            strategy = %strategy,
            "Starting playback attempt"
        );

        // Subscribe before the source is set so no early event is missed.
        tokio::spawn(pump_sink_events(
            Arc::clone(inner),
            generation,
            token,
            inner.sink.subscribe(),
        ));

        inner.sink.connect_graph();
        inner.announce(transition);
        if !inner.is_current(generation) {
            debug!(generation, "Selection superseded while loading");
            return generation;
        }
        inner.arm_load_timer(generation, seq);

        match strategy {
            Strategy::Direct => {
                inner.sink.set_source(&station.url);
                inner.sink.load();
            }
            Strategy::MediaSource => {
                inner.start_media_source(generation, seq, &station.url, detection.format);
            }
        }

        generation
    }

    /// Stop playback and return to `Idle`.
    ///
    /// Pending work of the current selection is cancelled and no further
    /// station notifications are emitted for it.
    pub fn stop(&self) {
        let inner = &self.inner;
        let (generation, from) = {
            let _wiring = inner.wiring.lock();
            let (generation, teardown) = {
                let mut state = inner.state.lock();
                let teardown = state.supersede(PlaybackState::Idle, None);
                (state.generation, teardown)
            };
            let from = teardown.from;
            inner.release(teardown);
            (generation, from)
        };

        if from != PlaybackState::Idle {
            info!(generation, "Playback stopped");
            inner.announce(Some(Transition {
                from,
                to: PlaybackState::Idle,
                generation,
            }));
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.state.lock().phase
    }

    /// The attempt currently owning the sink, if any.
    pub fn current_attempt(&self) -> Option<PlaybackAttempt> {
        self.inner.state.lock().attempt.clone()
    }

    pub fn current_station(&self) -> Option<StreamDescriptor> {
        self.inner.state.lock().station.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().is_current(generation)
    }

    fn is_current_load(&self, generation: u64, seq: u64) -> bool {
        let state = self.state.lock();
        state.is_current(generation) && state.load_seq == seq
    }

    fn announce(&self, transition: Option<Transition>) {
        if let Some(Transition {
            from,
            to,
            generation,
        }) = transition
        {
            info!(%from, %to, generation, "Playback state changed");
            self.notifier.state_changed(from, to, generation);
        }
    }

    /// Detach everything a superseded generation attached to the sink.
    fn release(&self, teardown: Teardown) {
        if let Some(buffer) = teardown.media_source {
            buffer.abort();
        }
        self.sink.pause();
        if teardown.graph_connected {
            self.sink.disconnect_graph();
        }
        self.sink.clear_source();
    }

    fn arm_load_timer(self: &Arc<Self>, generation: u64, seq: u64) {
        let token = self.state.lock().cancel.clone();
        let inner = Arc::clone(self);
        let timeout = self.config.load_timeout;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    trace!(generation, seq, "Load timer elapsed");
                    inner.start_playback(generation, seq);
                }
            }
        });
    }

    /// Open a buffered source and start feeding it, degrading to direct
    /// playback if the source cannot be created.
    fn start_media_source(self: &Arc<Self>, generation: u64, seq: u64, url: &str, format: FormatKey) {
        let _wiring = self.wiring.lock();
        if !self.is_current_load(generation, seq) {
            return;
        }
        let buffer = match self.sink.open_media_source(format.mime_type()) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.degrade_to_direct(generation, seq, &PlaybackError::MediaSource(e));
                return;
            }
        };

        let token = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || state.load_seq != seq {
                drop(state);
                buffer.abort();
                return;
            }
            state.media_source = Some(Arc::clone(&buffer));
            state.cancel.clone()
        };

        let inner = Arc::clone(self);
        let url = url.to_string();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = feed_media_source(inner.http.as_ref(), buffer.as_ref(), &url) => outcome,
            };

            match outcome {
                Ok(bytes) => debug!(generation, bytes, "Buffered source reached end of stream"),
                Err(e) => inner.on_feed_error(generation, seq, e),
            }
        });
    }

    fn on_feed_error(self: &Arc<Self>, generation: u64, seq: u64, error: PlaybackError) {
        let phase = {
            let state = self.state.lock();
            if !state.is_current(generation) || state.load_seq != seq {
                return;
            }
            state.phase
        };

        match phase {
            PlaybackState::Loading | PlaybackState::Attempting => {
                self.degrade_to_direct(generation, seq, &error)
            }
            _ => self.fail(generation, None, error),
        }
    }

    /// One-shot switch of the current attempt from the buffered source to
    /// direct playback. Not a retry: the attempt number is unchanged.
    fn degrade_to_direct(self: &Arc<Self>, generation: u64, seq: u64, cause: &PlaybackError) {
        let _wiring = self.wiring.lock();
        let (transition, buffer, url, next_seq) = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || state.load_seq != seq {
                return;
            }
            if !matches!(
                state.phase,
                PlaybackState::Loading | PlaybackState::Attempting
            ) {
                return;
            }
            let url = match state.attempt.as_mut() {
                Some(attempt) if attempt.strategy == Strategy::MediaSource => {
                    attempt.strategy = Strategy::Direct;
                    attempt.station.url.clone()
                }
                _ => return,
            };

            let transition = state.transition(PlaybackState::Loading);
            state.load_seq += 1;
            (transition, state.media_source.take(), url, state.load_seq)
        };

        warn!(error = %cause, "Buffered source failed, degrading to direct playback");
        if let Some(buffer) = buffer {
            buffer.abort();
        }

        self.announce(transition);
        if !self.is_current_load(generation, next_seq) {
            return;
        }
        self.arm_load_timer(generation, next_seq);
        self.sink.set_source(&url);
        self.sink.load();
    }

    fn handle_sink_event(self: &Arc<Self>, generation: u64, event: SinkEvent) {
        trace!(generation, event = event.name(), "Sink event");

        match event {
            _ if event.has_sufficient_data() => {
                let seq = {
                    let state = self.state.lock();
                    if !state.is_current(generation) || state.phase != PlaybackState::Loading {
                        return;
                    }
                    state.load_seq
                };
                self.start_playback(generation, seq);
            }
            SinkEvent::Waiting | SinkEvent::Stalled => {
                self.set_buffering(generation, true, event.name());
            }
            SinkEvent::Playing => {
                self.set_buffering(generation, false, event.name());
            }
            SinkEvent::Error(e) => self.fail(generation, None, PlaybackError::from_sink(e)),
            // A live stream has no natural end.
            SinkEvent::Ended => self.fail(generation, None, PlaybackError::StreamEnded),
            _ => {}
        }
    }

    fn set_buffering(&self, generation: u64, buffering: bool, reason: &str) {
        let (from, to) = if buffering {
            (PlaybackState::Playing, PlaybackState::Buffering)
        } else {
            (PlaybackState::Buffering, PlaybackState::Playing)
        };

        let (transition, station) = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || state.phase != from {
                return;
            }
            let Some(station) = state.station.clone() else {
                return;
            };
            (state.transition(to), station)
        };

        self.announce(transition);
        self.notifier.buffering(&station, buffering, reason);
    }

    /// `Loading -> Attempting`: issue `play()` and wait for it to settle.
    fn start_playback(self: &Arc<Self>, generation: u64, seq: u64) {
        let (transition, token) = {
            let mut state = self.state.lock();
            if !state.is_current(generation)
                || state.load_seq != seq
                || state.phase != PlaybackState::Loading
            {
                return;
            }
            (state.transition(PlaybackState::Attempting), state.cancel.clone())
        };
        self.announce(transition);

        let inner = Arc::clone(self);
        let timeout = self.config.load_timeout;
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = tokio::time::timeout(timeout, inner.sink.play()) => outcome,
            };

            match outcome {
                Ok(Ok(())) => inner.on_playing(generation, seq),
                Ok(Err(e)) => inner.fail(generation, Some(seq), PlaybackError::from_sink(e)),
                Err(_) => inner.fail(generation, Some(seq), PlaybackError::StartTimeout(timeout)),
            }
        });
    }

    fn on_playing(self: &Arc<Self>, generation: u64, seq: u64) {
        let (transition, station, first_start, start_sampler, token) = {
            let mut state = self.state.lock();
            if !state.is_current(generation)
                || state.load_seq != seq
                || state.phase != PlaybackState::Attempting
            {
                return;
            }
            let Some(station) = state.station.clone() else {
                return;
            };

            let transition = state.transition(PlaybackState::Playing);
            if let Some(attempt) = state.attempt.as_mut() {
                attempt.attempt_number = 1;
            }
            state.monitor.reset();

            let first_start = !state.station_loaded;
            state.station_loaded = true;

            let start_sampler = self.features.enable_buffer_monitor && !state.sampler_running;
            state.sampler_running |= start_sampler;

            (transition, station, first_start, start_sampler, state.cancel.clone())
        };

        self.announce(transition);
        if first_start {
            info!(station = %station.name, generation, "Station loaded");
            self.notifier.station_loaded(&station);
        }
        if start_sampler {
            tokio::spawn(sample_buffer_health(Arc::clone(self), generation, token));
        }
    }

    /// Classify `error` and either schedule a retry or give up.
    ///
    /// `seq` is set by tasks bound to one load; sink events pass `None`.
    fn fail(self: &Arc<Self>, generation: u64, seq: Option<u64>, error: PlaybackError) {
        let class = error.class();
        let max_retries = self.config.max_retries;

        let wiring = self.wiring.lock();
        let action = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || seq.is_some_and(|seq| seq != state.load_seq) {
                return;
            }
            if !state.phase.accepts_failures() {
                debug!(phase = %state.phase, error = %error, "Ignoring failure outside an active attempt");
                return;
            }
            let Some(attempt_number) = state.attempt.as_ref().map(|a| a.attempt_number) else {
                return;
            };
            let Some(station) = state.station.clone() else {
                return;
            };

            state.load_seq += 1;
            if class.is_retryable() && attempt_number < max_retries {
                FailureAction::Retry {
                    transition: state.transition(PlaybackState::Retrying),
                    station,
                    attempt: attempt_number,
                    seq: state.load_seq,
                    token: state.cancel.clone(),
                }
            } else {
                FailureAction::Fail {
                    transition: state.transition(PlaybackState::Failed),
                    station,
                    media_source: state.media_source.take(),
                }
            }
        };

        match action {
            FailureAction::Retry {
                transition,
                station,
                attempt,
                seq,
                token,
            } => {
                warn!(
                    %class,
                    error = %error,
                    attempt,
                    max_retries,
                    "Playback attempt failed, retrying"
                );
                drop(wiring);
                self.announce(transition);
                self.notifier.retrying(attempt, max_retries, &station);

                let inner = Arc::clone(self);
                let backoff = self.config.retry_backoff;
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(backoff) => inner.retry(generation, seq),
                    }
                });
            }
            FailureAction::Fail {
                transition,
                station,
                media_source,
            } => {
                error!(%class, error = %error, station = %station.name, "Playback failed");
                if let Some(buffer) = media_source {
                    buffer.abort();
                }
                self.sink.pause();
                drop(wiring);
                self.announce(transition);
                self.notifier.error(class, &error.to_string(), &station);
            }
        }
    }

    /// Backoff elapsed: reload the sink and go back to `Loading`.
    fn retry(self: &Arc<Self>, generation: u64, seq: u64) {
        let _wiring = self.wiring.lock();
        let (transition, attempt, buffer, next_seq) = {
            let mut state = self.state.lock();
            if !state.is_current(generation)
                || state.load_seq != seq
                || state.phase != PlaybackState::Retrying
            {
                return;
            }

            let now = self.clock.now();
            let Some(attempt) = state.attempt.as_mut() else {
                return;
            };
            attempt.attempt_number += 1;
            attempt.started_at = now;
            let attempt = attempt.clone();

            state.load_seq += 1;
            let buffer = state.media_source.take();
            (
                state.transition(PlaybackState::Loading),
                attempt,
                buffer,
                state.load_seq,
            )
        };

        if let Some(buffer) = buffer {
            buffer.abort();
        }

        info!(attempt = attempt.attempt_number, generation, "Retrying playback");
        self.announce(transition);
        if !self.is_current_load(generation, next_seq) {
            return;
        }
        self.arm_load_timer(generation, next_seq);

        match attempt.strategy {
            Strategy::Direct => self.sink.load(),
            Strategy::MediaSource => {
                self.start_media_source(generation, next_seq, &attempt.station.url, attempt.format)
            }
        }
    }

    /// Take one buffer-health sample and report the quality signal, if any.
    fn sample_health(&self, generation: u64) {
        let station = {
            let state = self.state.lock();
            if !state.is_current(generation) || state.phase != PlaybackState::Playing {
                return;
            }
            state.station.clone()
        };
        let Some(station) = station else {
            return;
        };

        let Some(sample) = BufferSample::from_sink(self.sink.as_ref()) else {
            trace!(generation, "No buffered range to sample");
            return;
        };

        let level = {
            let mut state = self.state.lock();
            if !state.is_current(generation) || state.phase != PlaybackState::Playing {
                return;
            }
            state.monitor.observe(sample)
        };

        if let Some(level) = level {
            debug!(%level, health = sample.health, "Buffer health signal");
            self.notifier.quality(&station, level, sample.health);
        }
    }
}

async fn pump_sink_events(
    inner: Arc<Inner>,
    generation: u64,
    token: CancellationToken,
    mut events: broadcast::Receiver<SinkEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(event) => inner.handle_sink_event(generation, event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(generation, skipped, "Sink event receiver lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    trace!(generation, "Sink event pump finished");
}

async fn sample_buffer_health(inner: Arc<Inner>, generation: u64, token: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.config.health_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => inner.sample_health(generation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ControllerState {
        ControllerState::new(BufferHealthMonitor::default())
    }

    #[test]
    fn test_supersede_bumps_generation_and_cancels() {
        let mut state = state();
        let old_token = state.cancel.clone();
        state.graph_connected = true;
        state.load_seq = 4;
        state.station_loaded = true;

        let teardown = state.supersede(
            PlaybackState::Probing,
            Some(StreamDescriptor::new("B", "https://b.example/live.mp3")),
        );

        assert!(old_token.is_cancelled());
        assert!(!state.cancel.is_cancelled());
        assert_eq!(state.generation, 1);
        assert_eq!(state.phase, PlaybackState::Probing);
        assert_eq!(state.load_seq, 0);
        assert!(!state.station_loaded);
        assert!(!state.graph_connected);
        assert!(teardown.graph_connected);
        assert_eq!(teardown.from, PlaybackState::Idle);
    }

    #[test]
    fn test_transition_rejects_illegal_moves() {
        let mut state = state();
        assert!(state.transition(PlaybackState::Playing).is_none());
        assert_eq!(state.phase, PlaybackState::Idle);

        let transition = state.transition(PlaybackState::Probing).unwrap();
        assert_eq!(transition.from, PlaybackState::Idle);
        assert_eq!(transition.to, PlaybackState::Probing);
        assert_eq!(state.phase, PlaybackState::Probing);
    }

    #[test]
    fn test_same_state_is_not_a_transition() {
        let mut state = state();
        state.phase = PlaybackState::Loading;
        assert!(state.transition(PlaybackState::Loading).is_none());
    }

    #[test]
    fn test_stale_generation_is_not_current() {
        let mut state = state();
        let first = state.generation;
        state.supersede(PlaybackState::Idle, None);
        assert!(!state.is_current(first));
        assert!(state.is_current(first + 1));
    }
}
