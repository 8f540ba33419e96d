//! Public player handle
//!
//! [`MediaPlayer`] is a cheap, cloneable handle that any number of callers
//! (UI, remote control, network handlers) can use concurrently. Each call is
//! queued onto the control loop; command methods return once their handler
//! has run there.
//!
//! Once the player has shut down every call is a silent no-op.

use super::core::{Command, PlayerCore, Request};
use crate::backend::Backend;
use crate::config::PlayerConfig;
use crate::error::Result;
use crate::playback::reply::ReplySlot;
use crate::resolver::StreamResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tubecast_common::{PlaylistSnapshot, StateChange};

/// Handle to a running player
#[derive(Debug, Clone)]
pub struct MediaPlayer {
    requests: mpsc::UnboundedSender<Request>,
}

impl MediaPlayer {
    /// Initialize the backend and spawn the player's control loop.
    ///
    /// Returns the handle, the state-change event stream, and the control
    /// loop task. The task resolves to `Ok(())` after the backend terminates
    /// and to `Err(Error::ContractViolation(..))` if the loop hit an
    /// impossible configuration; either way the event stream is closed.
    pub async fn start(
        backend: Arc<dyn Backend>,
        resolver: Arc<dyn StreamResolver>,
        config: &PlayerConfig,
    ) -> Result<(
        Self,
        mpsc::UnboundedReceiver<StateChange>,
        JoinHandle<Result<()>>,
    )> {
        let (backend_events, initial_volume) = backend.initialize().await?;
        info!("Backend initialized (volume={})", initial_volume);

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let core = PlayerCore::new(
            backend,
            resolver,
            config,
            initial_volume,
            event_tx,
            request_tx.clone(),
        );
        let task = tokio::spawn(core.run(request_rx, backend_events));

        Ok((
            Self {
                requests: request_tx,
            },
            event_rx,
            task,
        ))
    }

    /// Replace the playlist and play `playlist[index]` from `position`.
    ///
    /// An empty playlist stops playback.
    pub async fn set_playlist(&self, playlist: Vec<String>, index: usize, position: Duration) {
        self.submit(Command::SetPlaylist {
            playlist,
            index,
            position,
        })
        .await;
    }

    /// Replace the playlist without interrupting the current track.
    ///
    /// The current track must be part of the new playlist while it is active.
    pub async fn update_playlist(&self, playlist: Vec<String>) {
        self.submit(Command::UpdatePlaylist { playlist }).await;
    }

    /// Play `video_id` (which must be in the playlist) from `position`
    pub async fn set_current_track(&self, video_id: impl Into<String>, position: Duration) {
        self.submit(Command::SetCurrentTrack {
            video_id: video_id.into(),
            position,
        })
        .await;
    }

    /// Resume when paused, or start the current track from the beginning when stopped
    pub async fn play(&self) {
        self.submit(Command::Play).await;
    }

    pub async fn pause(&self) {
        self.submit(Command::Pause).await;
    }

    pub async fn seek(&self, position: Duration) {
        self.submit(Command::Seek { position }).await;
    }

    /// Stop playback and clear the playlist
    pub async fn stop(&self) {
        self.submit(Command::Stop).await;
    }

    /// Set the volume (clamped to 0-100); the effective volume is written to `reply`
    pub async fn set_volume(&self, volume: i32, reply: &ReplySlot<u8>) {
        self.submit(Command::SetVolume {
            volume,
            reply: reply.clone(),
        })
        .await;
    }

    /// Change the volume by `delta` (clamped to 0-100); the effective volume is written to `reply`
    pub async fn change_volume(&self, delta: i32, reply: &ReplySlot<u8>) {
        self.submit(Command::ChangeVolume {
            delta,
            reply: reply.clone(),
        })
        .await;
    }

    /// Request a playlist snapshot, written to `reply` without blocking the caller
    pub fn query_playlist(&self, reply: &ReplySlot<PlaylistSnapshot>) {
        self.submit_detached(Command::QueryPlaylist {
            reply: reply.clone(),
        });
    }

    /// Request the current volume, written to `reply` without blocking the caller
    pub fn query_volume(&self, reply: &ReplySlot<u8>) {
        self.submit_detached(Command::QueryVolume {
            reply: reply.clone(),
        });
    }

    /// Quit the backend and resolver.
    ///
    /// The player shuts down once the backend reports termination. No other
    /// method should be called afterwards; calls that race shutdown are ignored.
    pub async fn quit(&self) {
        self.submit(Command::Quit).await;
    }

    /// Whether the control loop has shut down
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    async fn submit(&self, command: Command) {
        let (done_tx, done_rx) = oneshot::channel();
        let request = Request {
            command,
            done: Some(done_tx),
        };
        if self.requests.send(request).is_err() {
            debug!("Player already stopped, ignoring request");
            return;
        }
        // An error here means the player stopped before handling the request
        let _ = done_rx.await;
    }

    fn submit_detached(&self, command: Command) {
        let request = Request {
            command,
            done: None,
        };
        if self.requests.send(request).is_err() {
            debug!("Player already stopped, ignoring query");
        }
    }
}
