//! Player-related type definitions
//!
//! Supporting types for player state reporting.

use serde::{Deserialize, Serialize};

/// Logical player state
///
/// The numeric values match the state codes used by the YouTube remote
/// protocol (stopped=0, playing=1, paused=2, buffering=3). `Seeking` has no
/// protocol code and is reported as buffering by [`PlayerState::protocol_code`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Buffering,
    Seeking,
}

impl PlayerState {
    /// Whether the backend has a loaded stream it can report a position for
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }

    /// Whether the state carries a pending resume position
    pub fn is_transitional(self) -> bool {
        matches!(self, PlayerState::Buffering | PlayerState::Seeking)
    }

    /// State code as understood by remote-control clients
    pub fn protocol_code(self) -> u8 {
        match self {
            PlayerState::Stopped => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering | PlayerState::Seeking => 3,
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Stopped => write!(f, "stopped"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Buffering => write!(f, "buffering"),
            PlayerState::Seeking => write!(f, "seeking"),
        }
    }
}
