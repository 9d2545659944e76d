//! # Stream Engine Data Model
//!
//! Plain data shared by the resolver, the codec registry and the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::ModuleKey;

/// Identity of a requested stream, as supplied by the station catalog.
///
/// Immutable once created; a new selection always builds a new descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub url: String,
    /// Free-form quality label from the catalog (e.g. "FLAC", "128k AAC+")
    pub declared_quality: Option<String>,
}

impl StreamDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            declared_quality: None,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.declared_quality = Some(quality.into());
        self
    }
}

/// Stream formats the engine knows how to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKey {
    Mp3,
    Aac,
    Ogg,
    Opus,
    Flac,
    Hls,
}

impl FormatKey {
    pub const ALL: [FormatKey; 6] = [
        FormatKey::Mp3,
        FormatKey::Aac,
        FormatKey::Ogg,
        FormatKey::Opus,
        FormatKey::Flac,
        FormatKey::Hls,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatKey::Mp3 => "mp3",
            FormatKey::Aac => "aac",
            FormatKey::Ogg => "ogg",
            FormatKey::Opus => "opus",
            FormatKey::Flac => "flac",
            FormatKey::Hls => "hls",
        }
    }

    /// Formats every sink is expected to decode straight from a URL.
    pub fn is_native(self) -> bool {
        matches!(self, FormatKey::Mp3 | FormatKey::Aac)
    }

    /// Canonical MIME type, used for sink capability queries.
    pub fn mime_type(self) -> &'static str {
        match self {
            FormatKey::Mp3 => "audio/mpeg",
            FormatKey::Aac => "audio/aac",
            FormatKey::Ogg => "audio/ogg",
            FormatKey::Opus => "audio/ogg; codecs=\"opus\"",
            FormatKey::Flac => "audio/flac",
            FormatKey::Hls => "application/vnd.apple.mpegurl",
        }
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative certainty attached to a detection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very-high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Station metadata carried in `icy-*` response headers.
///
/// Informational only; never used for format decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub bitrate_kbps: Option<u32>,
    pub name: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub sample_rate: Option<u32>,
}

impl StreamMetadata {
    pub fn is_empty(&self) -> bool {
        self == &StreamMetadata::default()
    }
}

/// Outcome of format resolution for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub format: FormatKey,
    pub mime_type: Option<String>,
    pub confidence: Confidence,
    pub metadata: StreamMetadata,
}

/// How the sink is fed for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Assign the URL and let the sink fetch and decode it.
    Direct,
    /// Stream bytes manually into a buffered source.
    MediaSource,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::MediaSource => "media-source",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authoritative attempt to play a station.
///
/// Exactly one attempt per generation is current; it is discarded the moment
/// a new station is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackAttempt {
    pub station: StreamDescriptor,
    pub generation: u64,
    pub format: FormatKey,
    /// Codec module backing this attempt, `None` for native formats or
    /// when the fallback chain was exhausted
    pub codec: Option<ModuleKey>,
    pub strategy: Strategy,
    /// 1-based; bumped on every retry
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
}

/// Advisory stream quality derived from buffer health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Poor,
    Good,
}

impl QualityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Poor => "poor",
            QualityLevel::Good => "good",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_formats() {
        let native: Vec<_> = FormatKey::ALL.iter().filter(|f| f.is_native()).collect();
        assert_eq!(native, vec![&FormatKey::Mp3, &FormatKey::Aac]);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::High < Confidence::VeryHigh);
        assert_eq!(Confidence::VeryHigh.to_string(), "very-high");
    }

    #[test]
    fn test_descriptor_builder() {
        let station = StreamDescriptor::new("Jazz FM", "http://jazz.example/live")
            .with_quality("320k MP3");
        assert_eq!(station.declared_quality.as_deref(), Some("320k MP3"));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&FormatKey::Flac).unwrap(), "\"flac\"");
        assert_eq!(
            serde_json::to_string(&Confidence::VeryHigh).unwrap(),
            "\"very-high\""
        );
        assert_eq!(
            serde_json::to_string(&Strategy::MediaSource).unwrap(),
            "\"media-source\""
        );
    }

    #[test]
    fn test_empty_metadata() {
        assert!(StreamMetadata::default().is_empty());
        let metadata = StreamMetadata {
            genre: Some("Jazz".to_string()),
            ..Default::default()
        };
        assert!(!metadata.is_empty());
    }
}
