//! Event types for the tubecast player
//!
//! State-change notifications emitted by the player and the playlist
//! snapshot returned by playlist queries.

mod player_types;

pub use player_types::PlayerState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// State change notification
///
/// Emitted every time the player finalizes a transition. The position is
/// always resolved at emission time (from the backend, or from the pending
/// buffering/seek position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// State after the transition
    pub state: PlayerState,
    /// Playback position at the moment of the transition
    #[serde(rename = "position_ms", with = "crate::time::duration_ms")]
    pub position: Duration,
    /// When the transition was finalized
    pub timestamp: DateTime<Utc>,
}

impl StateChange {
    pub fn new(state: PlayerState, position: Duration) -> Self {
        Self {
            state,
            position,
            timestamp: crate::time::now(),
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}",
            self.state,
            crate::time::format_position(self.position)
        )
    }
}

/// Point-in-time copy of the playlist state
///
/// Answer to a playlist query. Owns its data: later playlist changes never
/// show through a snapshot that was already handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Video identifiers in play order
    pub playlist: Vec<String>,
    /// Index of the current entry
    pub index: usize,
    /// Playback position of the current entry
    #[serde(rename = "position_ms", with = "crate::time::duration_ms")]
    pub position: Duration,
    /// Player state at query time
    pub state: PlayerState,
}

impl PlaylistSnapshot {
    /// Identifier at the snapshot's index, if any
    pub fn current(&self) -> Option<&str> {
        self.playlist.get(self.index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_serializes_position_as_millis() {
        let change = StateChange::new(PlayerState::Playing, Duration::from_millis(12_500));
        let value = serde_json::to_value(&change).unwrap();

        assert_eq!(value["state"], "playing");
        assert_eq!(value["position_ms"], 12_500);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_state_change_display() {
        let change = StateChange::new(PlayerState::Paused, Duration::from_secs(75));
        assert_eq!(change.to_string(), "paused at 1:15");
    }

    #[test]
    fn test_snapshot_current() {
        let snapshot = PlaylistSnapshot {
            playlist: vec!["a".into(), "b".into()],
            index: 1,
            position: Duration::ZERO,
            state: PlayerState::Stopped,
        };
        assert_eq!(snapshot.current(), Some("b"));

        let empty = PlaylistSnapshot {
            playlist: Vec::new(),
            index: 0,
            position: Duration::ZERO,
            state: PlayerState::Stopped,
        };
        assert_eq!(empty.current(), None);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = PlaylistSnapshot {
            playlist: vec!["x".into()],
            index: 0,
            position: Duration::from_millis(1500),
            state: PlayerState::Seeking,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PlaylistSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
