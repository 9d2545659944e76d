//! # Playback Configuration
//!
//! Tunables for probing, retries, health sampling and caching.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Playback engine configuration.
///
/// Every field has a serde default, so partial configuration documents are
/// accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Ceiling for the sink to report sufficient data before a start is
    /// forced, and for `play()` to settle.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout: Duration,

    /// Per-probe request ceiling.
    ///
    /// Default: 4 seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: Duration,

    /// Maximum attempts per selection for retryable failures.
    ///
    /// Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between a retryable failure and the next attempt.
    ///
    /// Default: 2 seconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: Duration,

    /// Buffer health sampling period while playing.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_health_interval")]
    pub health_interval: Duration,

    /// Health below this (and shrinking) is reported as poor.
    #[serde(default = "default_poor_health_secs")]
    pub poor_health_secs: f64,

    /// Health above this is reported as good.
    #[serde(default = "default_good_health_secs")]
    pub good_health_secs: f64,

    #[serde(default = "default_probe_cache_ttl")]
    pub probe_cache_ttl: Duration,

    #[serde(default = "default_cache_capacity")]
    pub probe_cache_capacity: usize,

    #[serde(default = "default_compat_cache_ttl")]
    pub compat_cache_ttl: Duration,

    #[serde(default = "default_cache_capacity")]
    pub compat_cache_capacity: usize,

    /// Prefix joined onto codec module resource locators.
    #[serde(default = "default_module_base_url")]
    pub module_base_url: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            load_timeout: default_load_timeout(),
            probe_timeout: default_probe_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            health_interval: default_health_interval(),
            poor_health_secs: default_poor_health_secs(),
            good_health_secs: default_good_health_secs(),
            probe_cache_ttl: default_probe_cache_ttl(),
            probe_cache_capacity: default_cache_capacity(),
            compat_cache_ttl: default_compat_cache_ttl(),
            compat_cache_capacity: default_cache_capacity(),
            module_base_url: default_module_base_url(),
        }
    }
}

impl PlaybackConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("load_timeout", self.load_timeout),
            ("probe_timeout", self.probe_timeout),
            ("health_interval", self.health_interval),
            ("probe_cache_ttl", self.probe_cache_ttl),
            ("compat_cache_ttl", self.compat_cache_ttl),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(PlaybackError::Config(format!("{} must be > 0", name)));
            }
        }

        if self.max_retries == 0 {
            return Err(PlaybackError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }

        if self.poor_health_secs < 0.0 || self.poor_health_secs >= self.good_health_secs {
            return Err(PlaybackError::Config(format!(
                "poor_health_secs ({}) must be non-negative and below good_health_secs ({})",
                self.poor_health_secs, self.good_health_secs
            )));
        }

        if self.probe_cache_capacity == 0 || self.compat_cache_capacity == 0 {
            return Err(PlaybackError::Config(
                "cache capacities must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_load_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(4)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(2000)
}

fn default_health_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_poor_health_secs() -> f64 {
    2.0
}

fn default_good_health_secs() -> f64 {
    5.0
}

fn default_probe_cache_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_compat_cache_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_cache_capacity() -> usize {
    256
}

fn default_module_base_url() -> String {
    "/codecs/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.load_timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff, Duration::from_millis(2000));
        assert_eq!(config.health_interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = PlaybackConfig {
            probe_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(msg)) if msg.contains("probe_timeout")));
    }

    #[test]
    fn test_rejects_zero_retries() {
        let config = PlaybackConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_health_thresholds() {
        let config = PlaybackConfig {
            poor_health_secs: 6.0,
            good_health_secs: 5.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = PlaybackConfig {
            compat_cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"max_retries": 5, "module_base_url": "https://cdn.example/"}"#)
                .unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.module_base_url, "https://cdn.example/");
        assert_eq!(config.load_timeout, Duration::from_secs(10));
    }
}
