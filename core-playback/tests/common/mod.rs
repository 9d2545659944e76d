//! Hand-written host fakes shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult, AudioSink, BridgeError, ByteStream, CodecModuleLoader,
    FixedClock, HttpClient, HttpRequest, HttpResponse, LoggerSink, MediaSourceBuffer, SinkError,
    SinkEvent,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use core_playback::{
    PlaybackCallbacks, PlaybackConfig, PlaybackState, QualityLevel, StreamDescriptor,
    StreamEngine,
};
use core_runtime::config::CoreConfig;
use core_runtime::logging::LoggingConfig;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Let spawned tasks run. Under a paused clock this also auto-advances time
/// by the given amount once every task is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

// ============================================================================
// Sink
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    SetSource(String),
    ClearSource,
    Load,
    Play,
    Pause,
    OpenMediaSource(String),
    ConnectGraph,
    DisconnectGraph,
}

/// Buffered source that enforces the one-update-at-a-time rule.
#[derive(Default)]
pub struct FakeBuffer {
    updating: AtomicBool,
    pub chunks: Mutex<Vec<Bytes>>,
    pub overlapping_appends: AtomicUsize,
    pub ended: AtomicBool,
    pub aborted: AtomicBool,
}

impl FakeBuffer {
    pub fn total_bytes(&self) -> usize {
        self.chunks.lock().iter().map(Bytes::len).sum()
    }
}

#[async_trait]
impl MediaSourceBuffer for FakeBuffer {
    fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    fn append(&self, chunk: Bytes) -> Result<(), SinkError> {
        if self.updating.swap(true, Ordering::SeqCst) {
            self.overlapping_appends.fetch_add(1, Ordering::SeqCst);
        }
        self.chunks.lock().push(chunk);
        Ok(())
    }

    async fn update_end(&self) {
        tokio::task::yield_now().await;
        self.updating.store(false, Ordering::SeqCst);
    }

    fn end_of_stream(&self) -> Result<(), SinkError> {
        self.ended.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }
}

/// Scriptable sink.
///
/// With `auto_ready` set, every `load()` and every opened buffered source is
/// followed by a `canplay` event. `play()` pops scripted results and
/// succeeds once the script is empty.
pub struct FakeSink {
    events: broadcast::Sender<SinkEvent>,
    calls: Mutex<Vec<SinkCall>>,
    play_results: Mutex<VecDeque<Result<(), SinkError>>>,
    play_hangs: AtomicBool,
    auto_ready: AtomicBool,
    media_source: AtomicBool,
    open_error: Mutex<Option<SinkError>>,
    playable: Mutex<Vec<String>>,
    buffered_end: Mutex<Option<f64>>,
    position: Mutex<f64>,
    subscribe_delay: Mutex<Option<Duration>>,
    pub buffers: Mutex<Vec<Arc<FakeBuffer>>>,
}

impl FakeSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            events,
            calls: Mutex::new(Vec::new()),
            play_results: Mutex::new(VecDeque::new()),
            play_hangs: AtomicBool::new(false),
            auto_ready: AtomicBool::new(true),
            media_source: AtomicBool::new(false),
            open_error: Mutex::new(None),
            playable: Mutex::new(vec!["audio/mpeg".to_string(), "audio/aac".to_string()]),
            buffered_end: Mutex::new(None),
            position: Mutex::new(0.0),
            subscribe_delay: Mutex::new(None),
            buffers: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, event: SinkEvent) {
        self.events.send(event).ok();
    }

    pub fn set_auto_ready(&self, enabled: bool) {
        self.auto_ready.store(enabled, Ordering::SeqCst);
    }

    pub fn set_media_source_supported(&self, supported: bool) {
        self.media_source.store(supported, Ordering::SeqCst);
    }

    pub fn fail_media_source_open(&self, error: SinkError) {
        *self.open_error.lock() = Some(error);
    }

    pub fn script_play(&self, result: Result<(), SinkError>) {
        self.play_results.lock().push_back(result);
    }

    pub fn hang_play(&self, hang: bool) {
        self.play_hangs.store(hang, Ordering::SeqCst);
    }

    pub fn set_buffer(&self, buffered_end: Option<f64>, position: f64) {
        *self.buffered_end.lock() = buffered_end;
        *self.position.lock() = position;
    }

    /// Block the calling thread inside the next `subscribe()`, the way a
    /// slow host event bridge would.
    pub fn delay_next_subscribe(&self, delay: Duration) {
        *self.subscribe_delay.lock() = Some(delay);
    }

    /// Source URL most recently handed to the sink.
    pub fn last_source(&self) -> Option<String> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SinkCall::SetSource(url) => Some(url.clone()),
            _ => None,
        })
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &SinkCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().push(call);
    }

    fn signal_ready(&self) {
        if self.auto_ready.load(Ordering::SeqCst) {
            self.emit(SinkEvent::CanPlay);
        }
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    fn set_source(&self, url: &str) {
        self.record(SinkCall::SetSource(url.to_string()));
    }

    fn clear_source(&self) {
        self.record(SinkCall::ClearSource);
    }

    fn load(&self) {
        self.record(SinkCall::Load);
        self.signal_ready();
    }

    async fn play(&self) -> Result<(), SinkError> {
        self.record(SinkCall::Play);
        if self.play_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let result = self.play_results.lock().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.emit(SinkEvent::Playing);
        }
        result
    }

    fn pause(&self) {
        self.record(SinkCall::Pause);
    }

    fn can_play_type(&self, mime_type: &str) -> bool {
        self.playable.lock().iter().any(|m| m == mime_type)
    }

    fn supports_media_source(&self, _mime_type: &str) -> bool {
        self.media_source.load(Ordering::SeqCst)
    }

    fn open_media_source(&self, mime_type: &str) -> Result<Arc<dyn MediaSourceBuffer>, SinkError> {
        self.record(SinkCall::OpenMediaSource(mime_type.to_string()));
        if let Some(error) = self.open_error.lock().clone() {
            return Err(error);
        }

        let buffer = Arc::new(FakeBuffer::default());
        self.buffers.lock().push(Arc::clone(&buffer));
        self.signal_ready();
        Ok(buffer)
    }

    fn connect_graph(&self) {
        self.record(SinkCall::ConnectGraph);
    }

    fn disconnect_graph(&self) {
        self.record(SinkCall::DisconnectGraph);
    }

    fn buffered_end(&self) -> Option<f64> {
        *self.buffered_end.lock()
    }

    fn position(&self) -> f64 {
        *self.position.lock()
    }

    fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        let delay = self.subscribe_delay.lock().take();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.events.subscribe()
    }
}

// ============================================================================
// Network and modules
// ============================================================================

/// HTTP fake. Unconfigured probes and streams fail like an unreachable host.
#[derive(Default)]
pub struct FakeHttp {
    head: Mutex<Option<HttpResponse>>,
    stream: Mutex<Option<Vec<Bytes>>>,
    pub requests: AtomicUsize,
}

impl FakeHttp {
    pub fn respond_to_probe(&self, response: HttpResponse) {
        *self.head.lock() = Some(response);
    }

    pub fn serve_stream(&self, chunks: &[&'static str]) {
        *self.stream.lock() = Some(
            chunks
                .iter()
                .map(|chunk| Bytes::from_static(chunk.as_bytes()))
                .collect(),
        );
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.head
            .lock()
            .clone()
            .ok_or_else(|| BridgeError::OperationFailed("host unreachable".to_string()))
    }

    async fn download_stream(&self, _url: String) -> BridgeResult<ByteStream> {
        let chunks = self
            .stream
            .lock()
            .clone()
            .ok_or_else(|| BridgeError::OperationFailed("connection reset".to_string()))?;
        Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

#[derive(Default)]
pub struct FakeLoader {
    failing: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl FakeLoader {
    pub fn failing(modules: &[&str]) -> Self {
        Self {
            failing: Mutex::new(modules.iter().map(|m| m.to_string()).collect()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CodecModuleLoader for FakeLoader {
    async fn load(&self, module: &str, _locator: &str) -> BridgeResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(module) {
            Err(BridgeError::NotAvailable(module.to_string()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Callbacks
// ============================================================================

#[derive(Default)]
pub struct RecordingCallbacks {
    pub errors: Mutex<Vec<(String, String, String)>>,
    pub retries: Mutex<Vec<(u32, u32, String)>>,
    pub buffering: Mutex<Vec<(bool, String)>>,
    pub quality: Mutex<Vec<(QualityLevel, f64)>>,
    pub loading: Mutex<Vec<String>>,
    pub loaded: Mutex<Vec<String>>,
    pub states: Mutex<Vec<(PlaybackState, PlaybackState)>>,
}

impl RecordingCallbacks {
    pub fn states(&self) -> Vec<(PlaybackState, PlaybackState)> {
        self.states.lock().clone()
    }

    pub fn retries(&self) -> Vec<(u32, u32)> {
        self.retries.lock().iter().map(|(a, m, _)| (*a, *m)).collect()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().clone()
    }
}

impl PlaybackCallbacks for RecordingCallbacks {
    fn on_error(&self, message: &str, raw_error: &str, station: &StreamDescriptor) {
        self.errors
            .lock()
            .push((message.to_string(), raw_error.to_string(), station.name.clone()));
    }

    fn on_retry(&self, attempt: u32, max_retries: u32, station: &StreamDescriptor) {
        self.retries
            .lock()
            .push((attempt, max_retries, station.name.clone()));
    }

    fn on_buffering_change(&self, is_buffering: bool, reason: &str) {
        self.buffering.lock().push((is_buffering, reason.to_string()));
    }

    fn on_quality_change(&self, level: QualityLevel, buffer_health: f64) {
        self.quality.lock().push((level, buffer_health));
    }

    fn on_station_loading(&self, name: &str) {
        self.loading.lock().push(name.to_string());
    }

    fn on_station_loaded(&self, name: &str) {
        self.loaded.lock().push(name.to_string());
    }

    fn on_state_change(&self, from: PlaybackState, to: PlaybackState) {
        self.states.lock().push((from, to));
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: StreamEngine,
    pub sink: Arc<FakeSink>,
    pub http: Arc<FakeHttp>,
    pub loader: Arc<FakeLoader>,
    pub callbacks: Arc<RecordingCallbacks>,
}

pub struct HarnessBuilder {
    probe: bool,
    media_source: bool,
    monitor: bool,
    loader: FakeLoader,
    sink: FakeSink,
    http: FakeHttp,
    config: PlaybackConfig,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    logging: Option<LoggingConfig>,
}

impl HarnessBuilder {
    pub fn probe(mut self, enabled: bool) -> Self {
        self.probe = enabled;
        self
    }

    pub fn media_source(mut self, enabled: bool) -> Self {
        self.media_source = enabled;
        self
    }

    pub fn monitor(mut self, enabled: bool) -> Self {
        self.monitor = enabled;
        self
    }

    pub fn loader(mut self, loader: FakeLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn sink(mut self, sink: FakeSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn http(mut self, http: FakeHttp) -> Self {
        self.http = http;
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn build(self) -> Harness {
        let sink = Arc::new(self.sink);
        let http = Arc::new(self.http);
        let loader = Arc::new(self.loader);
        let callbacks = Arc::new(RecordingCallbacks::default());

        let mut core = CoreConfig::builder()
            .http_client(http.clone())
            .clock(Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            )))
            .enable_network_probe(self.probe)
            .enable_media_source(self.media_source)
            .enable_buffer_monitor(self.monitor);
        if let Some(logger) = self.logger_sink {
            core = core.logger_sink(logger);
        }

        let mut engine = StreamEngine::builder(core.build().unwrap(), sink.clone())
            .config(self.config)
            .loader(loader.clone())
            .callbacks(callbacks.clone());
        if let Some(logging) = self.logging {
            engine = engine.logging(logging);
        }
        let engine = engine.build().unwrap();

        Harness {
            engine,
            sink,
            http,
            loader,
            callbacks,
        }
    }
}

impl Harness {
    /// Probing off, everything else on.
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            probe: false,
            media_source: true,
            monitor: true,
            loader: FakeLoader::default(),
            sink: FakeSink::new(),
            http: FakeHttp::default(),
            config: PlaybackConfig::default(),
            logger_sink: None,
            logging: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }
}

pub fn mp3_station(name: &str) -> StreamDescriptor {
    StreamDescriptor::new(name, format!("https://{}.radio.example/live.mp3", name.to_lowercase()))
}

pub fn network_error() -> SinkError {
    SinkError::media(bridge_traits::media_error::NETWORK, "connection reset")
}
