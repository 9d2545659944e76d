//! # Buffer Health
//!
//! Advisory quality signal derived from how far the buffered range extends
//! past the playhead. It never drives state transitions.

use bridge_traits::AudioSink;
use tokio::time::Instant;

use crate::types::QualityLevel;

/// One reading of the sink's buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferSample {
    pub buffered_end: f64,
    pub position: f64,
    /// Seconds buffered ahead of the playhead, never negative
    pub health: f64,
    pub timestamp: Instant,
}

impl BufferSample {
    pub fn new(buffered_end: f64, position: f64) -> Self {
        Self {
            buffered_end,
            position,
            health: (buffered_end - position).max(0.0),
            timestamp: Instant::now(),
        }
    }

    /// Read the sink. `None` when nothing is buffered yet.
    pub fn from_sink(sink: &dyn AudioSink) -> Option<Self> {
        let buffered_end = sink.buffered_end()?;
        Some(Self::new(buffered_end, sink.position()))
    }
}

/// Turns successive samples into quality signals.
///
/// - poor: health below the poor threshold and lower than the previous sample
/// - good: health above the good threshold
#[derive(Debug, Clone)]
pub struct BufferHealthMonitor {
    poor_threshold: f64,
    good_threshold: f64,
    previous: Option<BufferSample>,
}

impl BufferHealthMonitor {
    pub fn new(poor_threshold: f64, good_threshold: f64) -> Self {
        Self {
            poor_threshold,
            good_threshold,
            previous: None,
        }
    }

    /// Record `sample` and return the signal it produces, if any.
    pub fn observe(&mut self, sample: BufferSample) -> Option<QualityLevel> {
        let shrinking = self
            .previous
            .map_or(false, |previous| sample.health < previous.health);
        self.previous = Some(sample);

        if sample.health < self.poor_threshold && shrinking {
            Some(QualityLevel::Poor)
        } else if sample.health > self.good_threshold {
            Some(QualityLevel::Good)
        } else {
            None
        }
    }

    pub fn last_sample(&self) -> Option<BufferSample> {
        self.previous
    }

    /// Forget history, e.g. when a new attempt starts playing.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

impl Default for BufferHealthMonitor {
    fn default() -> Self {
        Self::new(2.0, 5.0)
    }
}
