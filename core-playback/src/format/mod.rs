//! # Format Detection
//!
//! Decides which stream format a station URL carries.
//!
//! - [`pattern`] classifies a URL or quality label by substring heuristics. It
//!   is pure and never blocks.
//! - [`mime`] maps `Content-Type` values to formats.
//! - [`probe`] issues a HEAD request and reads the declared content type and
//!   `icy-*` metadata.
//! - [`resolver`] merges both sources of evidence into a [`DetectionResult`]
//!   with a confidence tier.
//!
//! [`DetectionResult`]: crate::types::DetectionResult

pub mod mime;
pub mod pattern;
pub mod probe;
pub mod resolver;

pub use pattern::{classify, PatternMatch, DEFAULT_FORMAT};
pub use probe::{FormatProbe, ProbeResult};
pub use resolver::FormatResolver;
