//! Error types for tubecast-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for tubecast-player
#[derive(Error, Debug)]
pub enum Error {
    /// The caller or the state machine reached an impossible configuration.
    ///
    /// Fatal: the control loop terminates and closes its outputs.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Playback backend command failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Errors from the shared tubecast library
    #[error(transparent)]
    Common(#[from] tubecast_common::Error),
}

/// Failure reported by a playback backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend has no loaded stream to operate on
    #[error("no stream loaded")]
    NotLoaded,

    /// The backend process or connection is gone
    #[error("backend unavailable")]
    Unavailable,

    /// Command rejected by the backend
    #[error("command {command} failed: {reason}")]
    Command { command: &'static str, reason: String },
}

/// Convenience Result type using tubecast-player Error
pub type Result<T> = std::result::Result<T, Error>;
