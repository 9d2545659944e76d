//! URL and quality-label heuristics.

use url::Url;

use crate::types::FormatKey;

/// Format assumed when nothing matches: the most widely decodable one.
pub const DEFAULT_FORMAT: FormatKey = FormatKey::Mp3;

/// Ordered pattern table. The first format with a matching substring wins,
/// so more specific formats come before the generic lossy ones.
const PATTERNS: &[(FormatKey, &[&str])] = &[
    (FormatKey::Hls, &[".m3u8", "/hls/", "hls"]),
    (FormatKey::Flac, &[".flac", "flac", "lossless"]),
    (FormatKey::Opus, &[".opus", "opus"]),
    (FormatKey::Ogg, &[".ogg", ".oga", "vorbis", "ogg"]),
    (FormatKey::Aac, &[".aac", ".m4a", "aacp", "aac", "mp4a"]),
    (FormatKey::Mp3, &[".mp3", "mp3", "mpeg"]),
];

/// Result of a pattern lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub format: FormatKey,
    /// `false` when `format` is [`DEFAULT_FORMAT`] because nothing matched
    pub matched: bool,
}

/// Classify a stream by its URL and optional quality label.
pub fn classify(url: &str, quality_hint: Option<&str>) -> FormatKey {
    classify_with_evidence(url, quality_hint).format
}

/// Like [`classify`], but reports whether a pattern actually matched.
///
/// Only the path and query are matched; host names say nothing about the
/// stream format.
pub fn classify_with_evidence(url: &str, quality_hint: Option<&str>) -> PatternMatch {
    let target = match_target(url);
    let hint = quality_hint.map(str::to_lowercase).unwrap_or_default();

    for (format, patterns) in PATTERNS {
        let hit = patterns
            .iter()
            .any(|pattern| target.contains(pattern) || hint.contains(pattern));
        if hit {
            return PatternMatch {
                format: *format,
                matched: true,
            };
        }
    }

    PatternMatch {
        format: DEFAULT_FORMAT,
        matched: false,
    }
}

/// Lower-cased path and query of `url`, or the whole string when it is not
/// an absolute URL.
fn match_target(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let mut target = parsed.path().to_lowercase();
            if let Some(query) = parsed.query() {
                target.push('?');
                target.push_str(&query.to_lowercase());
            }
            target
        }
        Err(_) => url.to_lowercase(),
    }
}
