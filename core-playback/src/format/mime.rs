//! `Content-Type` to format mapping.

use crate::types::FormatKey;

const MIME_TABLE: &[(&str, FormatKey)] = &[
    ("audio/mpeg", FormatKey::Mp3),
    ("audio/mp3", FormatKey::Mp3),
    ("audio/mpeg3", FormatKey::Mp3),
    ("audio/aac", FormatKey::Aac),
    ("audio/aacp", FormatKey::Aac),
    ("audio/mp4", FormatKey::Aac),
    ("audio/x-m4a", FormatKey::Aac),
    ("audio/x-aac", FormatKey::Aac),
    ("audio/ogg", FormatKey::Ogg),
    ("application/ogg", FormatKey::Ogg),
    ("audio/vorbis", FormatKey::Ogg),
    ("audio/opus", FormatKey::Opus),
    ("audio/flac", FormatKey::Flac),
    ("audio/x-flac", FormatKey::Flac),
    ("application/vnd.apple.mpegurl", FormatKey::Hls),
    ("application/x-mpegurl", FormatKey::Hls),
    ("audio/mpegurl", FormatKey::Hls),
    ("audio/x-mpegurl", FormatKey::Hls),
];

/// Lower-cased media type with parameters removed.
pub fn strip_parameters(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a raw `Content-Type` value to a format.
///
/// The static table is consulted first; unmapped types fall through to a
/// substring guesser. An Ogg container whose `codecs` parameter names Opus
/// is reported as Opus.
pub fn format_for_content_type(content_type: &str) -> Option<FormatKey> {
    let essence = strip_parameters(content_type);
    if essence.is_empty() {
        return None;
    }

    let format = lookup(&essence).or_else(|| guess(&essence))?;

    if format == FormatKey::Ogg && content_type.to_ascii_lowercase().contains("opus") {
        return Some(FormatKey::Opus);
    }

    Some(format)
}

fn lookup(essence: &str) -> Option<FormatKey> {
    MIME_TABLE
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, format)| *format)
}

fn guess(essence: &str) -> Option<FormatKey> {
    // "mpegurl" has to be tested before "mpeg".
    if essence.contains("mpegurl") || essence.contains("m3u") {
        Some(FormatKey::Hls)
    } else if essence.contains("flac") {
        Some(FormatKey::Flac)
    } else if essence.contains("opus") {
        Some(FormatKey::Opus)
    } else if essence.contains("ogg") || essence.contains("vorbis") {
        Some(FormatKey::Ogg)
    } else if essence.contains("aac") || essence.contains("mp4") || essence.contains("m4a") {
        Some(FormatKey::Aac)
    } else if essence.contains("mpeg") || essence.contains("mp3") {
        Some(FormatKey::Mp3)
    } else {
        None
    }
}
