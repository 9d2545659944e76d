//! # Codec Modules
//!
//! Some formats need an extra module before the sink can play them. This
//! module names those modules, says where their resources live and which
//! ones to try, in order, for each format.

pub mod loader;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::types::FormatKey;

pub use loader::HttpModuleLoader;
pub use registry::{CodecModuleRegistry, LoadState, ResolvedModule};

/// Loadable codec modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKey {
    Flac,
    Opus,
    Vorbis,
    Hls,
    /// Buffered-source shim used when no format-specific decoder loads
    MediaSource,
}

impl ModuleKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKey::Flac => "flac",
            ModuleKey::Opus => "opus",
            ModuleKey::Vorbis => "vorbis",
            ModuleKey::Hls => "hls",
            ModuleKey::MediaSource => "media-source",
        }
    }

    /// Resource name relative to the module base URL.
    pub fn resource(self) -> &'static str {
        match self {
            ModuleKey::Flac => "flac-decoder.wasm",
            ModuleKey::Opus => "opus-decoder.wasm",
            ModuleKey::Vorbis => "vorbis-decoder.wasm",
            ModuleKey::Hls => "hls-demuxer.wasm",
            ModuleKey::MediaSource => "media-source-shim.wasm",
        }
    }

    /// Full locator for this module under `base_url`.
    ///
    /// An absolute base is treated as a directory even without a trailing
    /// slash. Relative bases are left for the host loader to resolve.
    pub fn locator(self, base_url: &str) -> String {
        match Url::parse(base_url) {
            Ok(mut base) => {
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                base.join(self.resource())
                    .map(String::from)
                    .unwrap_or_else(|_| self.relative_locator(base_url))
            }
            Err(_) => self.relative_locator(base_url),
        }
    }

    fn relative_locator(self, base_url: &str) -> String {
        if base_url.is_empty() || base_url.ends_with('/') {
            format!("{}{}", base_url, self.resource())
        } else {
            format!("{}/{}", base_url, self.resource())
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered modules to try for `format`. Native formats need none.
pub fn fallback_chain(format: FormatKey) -> &'static [ModuleKey] {
    match format {
        FormatKey::Mp3 | FormatKey::Aac => &[],
        FormatKey::Flac => &[ModuleKey::Flac, ModuleKey::MediaSource],
        FormatKey::Opus => &[ModuleKey::Opus, ModuleKey::MediaSource],
        FormatKey::Ogg => &[ModuleKey::Vorbis, ModuleKey::Opus, ModuleKey::MediaSource],
        FormatKey::Hls => &[ModuleKey::Hls, ModuleKey::MediaSource],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_formats_need_no_module() {
        for format in FormatKey::ALL {
            assert_eq!(fallback_chain(format).is_empty(), format.is_native());
        }
    }

    #[test]
    fn test_chains_end_with_media_source() {
        for format in FormatKey::ALL.into_iter().filter(|f| !f.is_native()) {
            assert_eq!(fallback_chain(format).last(), Some(&ModuleKey::MediaSource));
        }
    }

    #[test]
    fn test_locator_joining() {
        assert_eq!(ModuleKey::Flac.locator("/codecs/"), "/codecs/flac-decoder.wasm");
        assert_eq!(
            ModuleKey::Hls.locator("https://cdn.example/codecs"),
            "https://cdn.example/codecs/hls-demuxer.wasm"
        );
        assert_eq!(ModuleKey::Opus.locator(""), "opus-decoder.wasm");
    }

    #[test]
    fn test_absolute_locator_drops_base_query() {
        assert_eq!(
            ModuleKey::Flac.locator("https://cdn.example/codecs/?v=3"),
            "https://cdn.example/codecs/flac-decoder.wasm"
        );
        assert_eq!(
            ModuleKey::MediaSource.locator("https://cdn.example"),
            "https://cdn.example/media-source-shim.wasm"
        );
    }
}
