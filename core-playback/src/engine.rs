//! # Stream Engine
//!
//! One engine instance owns every cache, registry and state machine the core
//! needs. Nothing is global, so several engines (or several tests) can run
//! side by side.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{StreamDescriptor, StreamEngine};
//!
//! let engine = StreamEngine::builder(core_config, sink)
//!     .callbacks(Arc::new(MyCallbacks))
//!     .build()?;
//!
//! engine
//!     .play_station(StreamDescriptor::new("Jazz FM", "https://jazz.example/live.mp3"))
//!     .await;
//! ```

use bridge_traits::{AudioSink, CodecModuleLoader};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_runtime::logging::{init_logging, LoggingConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheStats;
use crate::codec::{CodecModuleRegistry, HttpModuleLoader, ModuleKey};
use crate::compat::{CompatibilityAssessor, CompatibilityReport};
use crate::config::PlaybackConfig;
use crate::controller::{
    ControllerDeps, NoopCallbacks, PlaybackCallbacks, PlaybackController, PlaybackState,
};
use crate::error::Result;
use crate::format::{FormatProbe, FormatResolver};
use crate::types::{PlaybackAttempt, StreamDescriptor};

/// Builder for [`StreamEngine`].
pub struct StreamEngineBuilder {
    core: CoreConfig,
    sink: Arc<dyn AudioSink>,
    config: PlaybackConfig,
    loader: Option<Arc<dyn CodecModuleLoader>>,
    callbacks: Arc<dyn PlaybackCallbacks>,
    logging: Option<LoggingConfig>,
}

impl StreamEngineBuilder {
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a host-provided module loader instead of fetching modules over
    /// HTTP from `module_base_url`.
    pub fn loader(mut self, loader: Arc<dyn CodecModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn callbacks(mut self, callbacks: Arc<dyn PlaybackCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Install the global tracing subscriber during [`build`](Self::build).
    ///
    /// Logs are mirrored to the core config's logger sink unless `logging`
    /// names its own. A subscriber installed earlier by the host is kept.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Validate both configurations and wire the engine together.
    ///
    /// # Errors
    ///
    /// Returns an error if either configuration is invalid.
    pub fn build(self) -> Result<StreamEngine> {
        self.core.validate()?;
        self.config.validate()?;

        let Self {
            core,
            sink,
            config,
            loader,
            callbacks,
            logging,
        } = self;

        if let Some(logging) = logging {
            if let Err(e) = init_logging(core.attach_logger_sink(logging)) {
                warn!(error = %e, "Keeping existing tracing subscriber");
            }
        }

        let events = EventBus::new(core.event_buffer_size);
        let features = core.features;

        let probe = features.enable_network_probe.then(|| {
            Arc::new(FormatProbe::new(
                Arc::clone(&core.http_client),
                config.probe_timeout,
                config.probe_cache_capacity,
                config.probe_cache_ttl,
            ))
        });
        let resolver = Arc::new(match &probe {
            Some(probe) => FormatResolver::new(Arc::clone(probe)),
            None => FormatResolver::pattern_only(),
        });

        let loader = loader.unwrap_or_else(|| {
            Arc::new(HttpModuleLoader::new(
                Arc::clone(&core.http_client),
                config.load_timeout,
            ))
        });
        let registry = Arc::new(CodecModuleRegistry::new(
            loader,
            config.module_base_url.clone(),
            events.clone(),
        ));

        let compat = CompatibilityAssessor::new(
            Arc::clone(&sink),
            Arc::clone(&registry),
            features.enable_media_source,
            config.compat_cache_capacity,
            config.compat_cache_ttl,
        );

        let controller = PlaybackController::new(
            ControllerDeps {
                sink,
                http: Arc::clone(&core.http_client),
                resolver,
                registry: Arc::clone(&registry),
                callbacks,
                events: events.clone(),
                clock: Arc::clone(&core.clock),
            },
            config,
            features,
        );

        info!(?features, "Stream engine initialized");

        Ok(StreamEngine {
            controller,
            probe,
            registry,
            compat,
            events,
        })
    }
}

/// Facade over the playback controller and its collaborators.
pub struct StreamEngine {
    controller: PlaybackController,
    probe: Option<Arc<FormatProbe>>,
    registry: Arc<CodecModuleRegistry>,
    compat: CompatibilityAssessor,
    events: EventBus,
}

impl StreamEngine {
    pub fn builder(core: CoreConfig, sink: Arc<dyn AudioSink>) -> StreamEngineBuilder {
        StreamEngineBuilder {
            core,
            sink,
            config: PlaybackConfig::default(),
            loader: None,
            callbacks: Arc::new(NoopCallbacks),
            logging: None,
        }
    }

    /// Select a station. See [`PlaybackController::play_station`].
    pub async fn play_station(&self, station: StreamDescriptor) -> u64 {
        self.controller.play_station(station).await
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn current_attempt(&self) -> Option<PlaybackAttempt> {
        self.controller.current_attempt()
    }

    pub fn current_station(&self) -> Option<StreamDescriptor> {
        self.controller.current_station()
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Synchronous compatibility grade for `station`. Never performs I/O.
    pub fn assess_compatibility(&self, station: &StreamDescriptor) -> CompatibilityReport {
        self.compat.assess(station)
    }

    /// Load codec modules ahead of the first selection that needs them.
    #[instrument(skip(self))]
    pub async fn preload_modules(&self, keys: &[ModuleKey]) -> HashMap<ModuleKey, bool> {
        self.registry.load_many(keys).await
    }

    /// Drop cached probe results and compatibility reports.
    pub fn clear_caches(&self) {
        if let Some(probe) = &self.probe {
            probe.clear_cache();
        }
        self.compat.clear_cache();
        debug!("Engine caches cleared");
    }

    /// Probe cache statistics, `None` when probing is disabled.
    pub fn probe_cache_stats(&self) -> Option<CacheStats> {
        self.probe.as_ref().map(|probe| probe.cache_stats())
    }

    pub fn compatibility_cache_stats(&self) -> CacheStats {
        self.compat.cache_stats()
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Event stream over everything the engine reports.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }
}
