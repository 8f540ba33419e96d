//! Playback backend contract
//!
//! The backend is the external engine that decodes and renders a stream.
//! The player only issues commands and listens to the backend's own state
//! reports; it never assumes a command took effect until the matching event
//! arrives.

use crate::error::BackendError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// State reported asynchronously by the backend
///
/// A seek completion is reported as `Playing`, whatever the state before the
/// seek was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    Playing,
    Paused,
    Stopped,
}

/// Result type for backend commands
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Trait for playback backend operations.
///
/// Commands are issued only from the player's control loop, one at a time.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Starts the backend.
    ///
    /// Returns the backend event stream and the backend's startup volume
    /// (0-100). The stream closing means the backend has terminated.
    async fn initialize(&self) -> BackendResult<(mpsc::UnboundedReceiver<BackendEvent>, u8)>;

    /// Loads and plays a stream from `start`.
    ///
    /// `volume` is `Some` when a volume change is pending and must be applied
    /// together with the new stream.
    async fn play(&self, stream_url: &str, start: Duration, volume: Option<u8>) -> BackendResult<()>;

    async fn pause(&self) -> BackendResult<()>;

    async fn resume(&self) -> BackendResult<()>;

    async fn stop(&self) -> BackendResult<()>;

    /// Seeks within the loaded stream. Completion is reported as `Playing`.
    async fn set_position(&self, position: Duration) -> BackendResult<()>;

    async fn set_volume(&self, volume: u8) -> BackendResult<()>;

    /// Current playback position.
    ///
    /// Only meaningful while a stream is playing or paused.
    async fn get_position(&self) -> BackendResult<Duration>;

    /// Terminates the backend. Its event stream closes afterwards.
    async fn quit(&self) -> BackendResult<()>;
}
