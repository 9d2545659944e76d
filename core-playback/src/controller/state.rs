//! Playback state machine states and allowed transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    /// Resolving format and codec module
    Probing,
    /// Waiting for the sink to buffer enough data
    Loading,
    /// `play()` issued, waiting for it to settle
    Attempting,
    Playing,
    /// Playing but starved of data
    Buffering,
    /// Waiting out the backoff before the next attempt
    Retrying,
    Failed,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Probing => "probing",
            PlaybackState::Loading => "loading",
            PlaybackState::Attempting => "attempting",
            PlaybackState::Playing => "playing",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Retrying => "retrying",
            PlaybackState::Failed => "failed",
        }
    }

    /// Transition table. Any state may return to `Idle` on a new selection
    /// or `stop()`.
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::*;

        if next == Idle {
            return true;
        }

        matches!(
            (self, next),
            (Idle, Probing)
                | (Probing, Loading)
                | (Loading, Attempting)
                | (Loading, Retrying)
                | (Loading, Failed)
                | (Attempting, Playing)
                | (Attempting, Retrying)
                | (Attempting, Failed)
                // One-shot degrade from the buffered source to direct playback
                | (Attempting, Loading)
                | (Playing, Buffering)
                | (Playing, Retrying)
                | (Playing, Failed)
                | (Buffering, Playing)
                | (Buffering, Retrying)
                | (Buffering, Failed)
                | (Retrying, Loading)
        )
    }

    /// States in which sink failures are acted upon.
    pub fn accepts_failures(self) -> bool {
        matches!(
            self,
            PlaybackState::Loading
                | PlaybackState::Attempting
                | PlaybackState::Playing
                | PlaybackState::Buffering
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
