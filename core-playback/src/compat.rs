//! # Compatibility Assessment
//!
//! Instant, I/O-free answer to "how well will this station play here?",
//! suitable for rendering a badge next to a station in a list.

use bridge_traits::AudioSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStats, TtlCache};
use crate::codec::{fallback_chain, CodecModuleRegistry};
use crate::controller::select_strategy;
use crate::format::FormatResolver;
use crate::types::{Confidence, FormatKey, StreamDescriptor, Strategy};

/// How a format is expected to play on this sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    /// The sink decodes the format itself
    Native,
    /// Plays through a loaded codec module and the buffered source
    Enhanced,
    /// Will be attempted directly; the sink may reject it
    Limited,
}

impl CompatibilityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CompatibilityLevel::Native => "native",
            CompatibilityLevel::Enhanced => "enhanced",
            CompatibilityLevel::Limited => "limited",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub format: FormatKey,
    pub confidence: Confidence,
    pub level: CompatibilityLevel,
    /// Strategy a selection would use right now
    pub strategy: Strategy,
}

/// Grades stations from the pattern table and what is already loaded.
pub struct CompatibilityAssessor {
    sink: Arc<dyn AudioSink>,
    registry: Arc<CodecModuleRegistry>,
    media_source_enabled: bool,
    cache: TtlCache<String, CompatibilityReport>,
}

impl CompatibilityAssessor {
    pub fn new(
        sink: Arc<dyn AudioSink>,
        registry: Arc<CodecModuleRegistry>,
        media_source_enabled: bool,
        cache_capacity: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            sink,
            registry,
            media_source_enabled,
            cache: TtlCache::new("compatibility", cache_capacity, cache_ttl),
        }
    }

    /// Assess `station`. Never blocks and never touches the network.
    ///
    /// Reports are cached per URL; a module that finishes loading later is
    /// reflected once the cached report expires or the cache is cleared.
    pub fn assess(&self, station: &StreamDescriptor) -> CompatibilityReport {
        if let Some(report) = self.cache.get(&station.url) {
            return report;
        }

        let detection =
            FormatResolver::resolve_sync(&station.url, station.declared_quality.as_deref());
        let format = detection.format;

        let loaded_module = fallback_chain(format)
            .iter()
            .copied()
            .find(|key| self.registry.is_loaded(*key));
        let strategy = select_strategy(
            format,
            loaded_module,
            self.sink.as_ref(),
            self.media_source_enabled,
        );

        let level = if format.is_native() {
            CompatibilityLevel::Native
        } else if strategy == Strategy::MediaSource {
            CompatibilityLevel::Enhanced
        } else if self.sink.can_play_type(format.mime_type()) {
            CompatibilityLevel::Native
        } else {
            CompatibilityLevel::Limited
        };

        let report = CompatibilityReport {
            format,
            confidence: detection.confidence,
            level,
            strategy,
        };
        self.cache.insert(station.url.clone(), report.clone());
        report
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
