//! # Host Bridge Traits
//!
//! Contracts between the stream engine and the host application.
//!
//! ## Overview
//!
//! The engine decides *how* a live stream should be played; the host owns
//! everything that actually touches the network, the audio device and the
//! codec resources. Each trait here is one such capability:
//!
//! - [`HttpClient`](http::HttpClient) - HEAD-style probing and cancellable streamed reads
//! - [`AudioSink`](playback::AudioSink) - the single playback sink and its event stream
//! - [`MediaSourceBuffer`](playback::MediaSourceBuffer) - manually fed buffered source
//! - [`CodecModuleLoader`](codec::CodecModuleLoader) - materialises codec modules on demand
//! - [`Clock`](time::Clock) - wall-clock source for deterministic tests
//! - [`LoggerSink`](time::LoggerSink) - forwards structured logs to host logging
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop` (HTTP only; sinks are host-specific) |
//!
//! ## Error Handling
//!
//! Bridges report failures with [`BridgeError`](error::BridgeError), except for
//! the sink, whose errors ([`SinkError`](playback::SinkError)) carry the media
//! error code or exception name the engine needs for classification.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one instance can be shared by
//! every task of a playback generation.

pub mod codec;
pub mod error;
pub mod http;
pub mod playback;
pub mod time;

pub use error::BridgeError;

pub use codec::CodecModuleLoader;
pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use playback::{media_error, AudioSink, MediaSourceBuffer, SinkError, SinkEvent};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
