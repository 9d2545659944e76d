//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Only the network bridge has a portable desktop implementation:
//! - `HttpClient` using `reqwest`
//!
//! Audio sinks are tied to the host's audio stack and are always injected by
//! the application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let config = CoreConfig::builder().http_client(http_client).build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
