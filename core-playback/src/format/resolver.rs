//! Merges probe and pattern evidence.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::pattern::{classify_with_evidence, PatternMatch};
use super::probe::{FormatProbe, ProbeResult};
use crate::types::{Confidence, DetectionResult, StreamMetadata};
use core_runtime::logging::redact_url;

/// Resolves a station URL to a format with a confidence tier.
///
/// | Evidence | Confidence |
/// |---|---|
/// | probe succeeded, pattern agrees | very-high |
/// | probe succeeded alone | high |
/// | no probe, pattern matched | medium |
/// | no probe, default format | low |
pub struct FormatResolver {
    probe: Option<Arc<FormatProbe>>,
}

impl FormatResolver {
    /// Resolver backed by a network probe.
    pub fn new(probe: Arc<FormatProbe>) -> Self {
        Self { probe: Some(probe) }
    }

    /// Resolver that never touches the network.
    pub fn pattern_only() -> Self {
        Self { probe: None }
    }

    /// Resolve using both the probe (if configured) and the pattern table.
    #[instrument(skip(self, url, quality_hint), fields(url = %redact_url(url)))]
    pub async fn resolve(&self, url: &str, quality_hint: Option<&str>) -> DetectionResult {
        let pattern = classify_with_evidence(url, quality_hint);

        let probe = match &self.probe {
            Some(probe) => Some(probe.detect(url).await),
            None => None,
        };

        let result = merge(pattern, probe.as_ref());
        debug!(
            format = %result.format,
            confidence = %result.confidence,
            "Resolved stream format"
        );
        result
    }

    /// Pattern-only resolution. Never performs I/O.
    pub fn resolve_sync(url: &str, quality_hint: Option<&str>) -> DetectionResult {
        merge(classify_with_evidence(url, quality_hint), None)
    }
}

/// Combine the two sources of evidence.
pub fn merge(pattern: PatternMatch, probe: Option<&ProbeResult>) -> DetectionResult {
    if let Some(ProbeResult {
        detected: true,
        format: Some(format),
        mime_type,
        metadata,
        ..
    }) = probe
    {
        let confidence = if *format == pattern.format {
            Confidence::VeryHigh
        } else {
            Confidence::High
        };
        return DetectionResult {
            format: *format,
            mime_type: mime_type.clone(),
            confidence,
            metadata: metadata.clone(),
        };
    }

    let confidence = if pattern.matched {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    DetectionResult {
        format: pattern.format,
        mime_type: None,
        confidence,
        // Failed probes can still carry icy headers.
        metadata: probe
            .map(|p| p.metadata.clone())
            .unwrap_or_else(StreamMetadata::default),
    }
}
