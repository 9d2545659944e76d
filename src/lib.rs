//! Workspace facade crate.
//!
//! Host applications can depend on `airwave-workspace` and get the stream
//! engine, its runtime plumbing and the bridge contracts from a single place.
//! With the default `desktop-shims` feature the reqwest-backed HTTP client is
//! re-exported as well, so a desktop host only has to supply an `AudioSink`.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_playback::{
    ErrorClass, FormatKey, PlaybackCallbacks, PlaybackController, PlaybackError, PlaybackState,
    StreamDescriptor, StreamEngine,
};
