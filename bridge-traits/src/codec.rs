//! Codec module loading.
//!
//! Some stream formats need an extra decoder module before the sink can play
//! them (a lossless decoder, an HLS demuxer, a buffered-source shim). Hosts
//! decide how such a module is materialised; the core only asks for it by key
//! and resource locator.

use async_trait::async_trait;

use crate::error::Result;

/// Loads codec modules on behalf of the core.
///
/// Implementations do not need to deduplicate concurrent requests; the core
/// registry guarantees at most one in-flight load per module key.
#[async_trait]
pub trait CodecModuleLoader: Send + Sync {
    /// Load `module` from `locator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be fetched or initialised.
    async fn load(&self, module: &str, locator: &str) -> Result<()>;
}
