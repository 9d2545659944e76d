//! # Core Configuration Module
//!
//! Holds the host bridges and global switches the stream engine needs.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance. It enforces fail-fast validation so a missing bridge surfaces at
//! startup instead of on the first station selection.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Probing stream headers (desktop default: reqwest)
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Wall-clock source (default: [`SystemClock`])
//! - `LoggerSink` - Forwards engine logs into host logging
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .enable_media_source(false)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{Clock, HttpClient, LoggerSink, SystemClock};
use std::sync::Arc;

/// Default capacity of the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Core configuration for the stream engine.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client used for header probes
    pub http_client: Arc<dyn HttpClient>,

    /// Wall-clock source for attempt timestamps
    pub clock: Arc<dyn Clock>,

    /// Optional host log forwarding
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Capacity of the broadcast channel behind the event bus
    pub event_buffer_size: usize,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional engine behaviour.
///
/// All features are on by default. Turning one off degrades gracefully:
/// no probe means pattern-only resolution, no media source means every
/// stream plays through the direct path, no monitor means no quality
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Issue header probes before choosing a format
    pub enable_network_probe: bool,

    /// Allow the buffered media-source path for non-native formats
    pub enable_media_source: bool,

    /// Sample buffer health while playing
    pub enable_buffer_monitor: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_network_probe: true,
            enable_media_source: true,
            enable_buffer_monitor: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Default logging configuration forwarding to [`Self::logger_sink`].
    pub fn logging_config(&self) -> LoggingConfig {
        self.attach_logger_sink(LoggingConfig::default())
    }

    /// Route `logging` to this config's logger sink unless it already names
    /// one.
    pub fn attach_logger_sink(&self, mut logging: LoggingConfig) -> LoggingConfig {
        if logging.logger_sink.is_none() {
            logging.logger_sink = self.logger_sink.clone();
        }
        logging
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > 10_000 {
            return Err(Error::Config(
                "Event buffer size exceeds maximum of 10,000".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for stream header probes. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a client backed by the platform networking stack."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client used for header probes.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn enable_network_probe(mut self, enabled: bool) -> Self {
        self.features.enable_network_probe = enabled;
        self
    }

    pub fn enable_media_source(mut self, enabled: bool) -> Self {
        self.features.enable_media_source = enabled;
        self
    }

    pub fn enable_buffer_monitor(mut self, enabled: bool) -> Self {
        self.features.enable_buffer_monitor = enabled;
        self
    }

    /// Replaces all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No `HttpClient` was provided and no platform default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
