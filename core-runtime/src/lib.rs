//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the stream engine:
//! - Logging and tracing infrastructure
//! - Configuration management (bridges and feature flags)
//! - Event bus system
//!
//! ## Overview
//!
//! `core-playback` builds on these pieces: it logs through `tracing`, takes
//! its host bridges from a validated [`CoreConfig`](config::CoreConfig) and
//! mirrors every outward notification onto the [`EventBus`](events::EventBus).

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
