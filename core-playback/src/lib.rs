//! # Live Stream Playback
//!
//! Decides how a live radio stream should be played on a host-owned sink and
//! keeps it playing.
//!
//! ## Overview
//!
//! This crate handles:
//! - Format detection from URL patterns and header probes ([`format`])
//! - On-demand codec modules with per-format fallback chains ([`codec`])
//! - The playback state machine with bounded retries and generation-based
//!   cancellation ([`controller`])
//! - Advisory buffer-health signals ([`health`])
//! - Instant compatibility grading for station lists ([`compat`])
//!
//! [`StreamEngine`] wires all of it together behind one instance.

pub mod cache;
pub mod codec;
pub mod compat;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod format;
pub mod health;
pub mod types;

pub use codec::{CodecModuleRegistry, HttpModuleLoader, ModuleKey};
pub use compat::{CompatibilityLevel, CompatibilityReport};
pub use config::PlaybackConfig;
pub use controller::{
    ControllerDeps, NoopCallbacks, PlaybackCallbacks, PlaybackController, PlaybackState,
};
pub use engine::{StreamEngine, StreamEngineBuilder};
pub use error::{ErrorClass, PlaybackError, Result};
pub use health::{BufferHealthMonitor, BufferSample};
pub use types::{
    Confidence, DetectionResult, FormatKey, PlaybackAttempt, QualityLevel, StreamDescriptor,
    StreamMetadata, Strategy,
};
