//! Caller command handlers
//!
//! **Responsibilities:**
//! - Playlist replacement and relocation of the active track
//! - Transport commands (play, pause, seek, stop)
//! - Volume commands and point-in-time queries
//!
//! Commands issued in a state where they do not apply are logged and ignored.

use super::core::PlayerCore;
use crate::error::Result;
use crate::playback::reply::ReplySlot;
use crate::playback::state::{Phase, Resume};
use std::time::Duration;
use tracing::{debug, info, warn};
use tubecast_common::PlaylistSnapshot;

impl PlayerCore {
    /// Replace the playlist and start playing `playlist[index]` at `position`.
    ///
    /// An empty playlist stops playback.
    pub(super) async fn set_playlist(
        &mut self,
        playlist: Vec<String>,
        mut index: usize,
        position: Duration,
    ) -> Result<()> {
        let requested = playlist.get(index).map(String::as_str);
        if let Phase::Buffering { position: pending } = self.state.phase {
            if pending == position && requested.is_some() && requested == self.state.current_video() {
                debug!("Track already loading at the requested position, only updating playlist");
                return self.update_playlist(playlist);
            }
        }

        if !playlist.is_empty() && index >= playlist.len() {
            warn!(
                "Playlist index {} out of range for {} entries, using last entry",
                index,
                playlist.len()
            );
            index = playlist.len() - 1;
        }

        info!("New playlist: {} entries, index {}", playlist.len(), index);
        self.state.playlist = playlist;
        self.state.index = index;

        if self.state.playlist.is_empty() {
            self.stop().await
        } else {
            self.start_playing(position).await
        }
    }

    /// Replace the playlist without interrupting playback.
    ///
    /// While a track is active it must still be present in the new playlist;
    /// its first occurrence becomes the current index.
    pub(super) fn update_playlist(&mut self, playlist: Vec<String>) -> Result<()> {
        let old_next = self.state.next_video().map(str::to_owned);

        if self.state.playlist.is_empty() {
            if self.state.phase == Phase::Playing {
                return Err(Self::violation("empty playlist while playing"));
            }
            self.state.playlist = playlist;
            if self.state.index >= self.state.playlist.len() {
                // Out-of-range indices point at the last entry, as remote clients expect
                self.state.index = self.state.playlist.len().saturating_sub(1);
            }
        } else {
            let Some(current) = self.state.current_video().map(str::to_owned) else {
                return Err(Self::violation(format!(
                    "index {} out of range for {} entries",
                    self.state.index,
                    self.state.playlist.len()
                )));
            };
            self.state.playlist = playlist;
            if self.state.phase == Phase::Stopped && self.state.locate(&current).is_none() {
                warn!(
                    "Stopped track {} not in new playlist, keeping index {}",
                    current, self.state.index
                );
                if self.state.index >= self.state.playlist.len() {
                    self.state.index = self.state.playlist.len().saturating_sub(1);
                }
            } else {
                self.relocate(&current)?;
            }
        }

        debug!(
            "Playlist updated: {} entries, index {}",
            self.state.playlist.len(),
            self.state.index
        );

        let new_next = self.state.next_video().map(str::to_owned);
        if new_next != old_next {
            self.schedule_prefetch(new_next);
        }
        Ok(())
    }

    /// Jump to `video_id` within the current playlist
    pub(super) async fn set_current_track(&mut self, video_id: &str, position: Duration) -> Result<()> {
        self.relocate(video_id)?;
        self.start_playing(position).await
    }

    /// Point the current index at the first occurrence of `video_id`
    pub(super) fn relocate(&mut self, video_id: &str) -> Result<()> {
        let Some(found) = self.state.locate(video_id) else {
            return Err(Self::violation(format!(
                "current video {} does not exist in new playlist",
                video_id
            )));
        };
        if found.duplicated {
            warn!("Video {} exists more than once in playlist, using first", video_id);
        }
        self.state.index = found.index;
        Ok(())
    }

    pub(super) async fn play(&mut self) -> Result<()> {
        match self.state.phase {
            Phase::Stopped => {
                if self.state.current_video().is_none() {
                    warn!("Play with empty playlist or invalid index - ignoring");
                    return Ok(());
                }
                // Restart from the beginning
                self.start_playing(Duration::ZERO).await
            }
            Phase::Seeking { ref mut queued, .. } => {
                *queued = Some(Resume::Playing);
                Ok(())
            }
            Phase::Paused => {
                self.backend_command("resume", self.backend.resume().await);
                Ok(())
            }
            _ => {
                warn!("Resume while {} - ignoring", self.state.state());
                Ok(())
            }
        }
    }

    pub(super) async fn pause(&mut self) -> Result<()> {
        match self.state.phase {
            Phase::Seeking { ref mut queued, .. } => {
                *queued = Some(Resume::Paused);
            }
            Phase::Playing => {
                self.backend_command("pause", self.backend.pause().await);
            }
            _ => {
                warn!("Pause while {} - ignoring", self.state.state());
            }
        }
        Ok(())
    }

    pub(super) async fn seek(&mut self, position: Duration) -> Result<()> {
        match self.state.phase {
            Phase::Stopped => {
                if self.state.current_video().is_none() {
                    warn!("Seek with empty playlist - ignoring");
                    return Ok(());
                }
                self.start_playing(position).await
            }
            Phase::Playing | Phase::Paused => {
                self.enter_seeking(position);
                self.backend_command("set_position", self.backend.set_position(position).await);
                Ok(())
            }
            _ => {
                warn!(
                    "Seek while {} (not paused or playing) - ignoring",
                    self.state.state()
                );
                Ok(())
            }
        }
    }

    /// Stop playback and clear the playlist.
    ///
    /// The index is kept: a playlist update following a stop may need it.
    pub(super) async fn stop(&mut self) -> Result<()> {
        self.state.playlist.clear();
        self.backend_command("stop", self.backend.stop().await);

        // The backend does not report a stop for a track that never started
        if matches!(self.state.phase, Phase::Buffering { .. }) {
            self.settle(Phase::Stopped, Some(Duration::ZERO)).await?;
        }
        Ok(())
    }

    /// Apply the state's volume now if a stream is loaded, else defer it.
    /// Reports the effective volume either way.
    pub(super) async fn apply_volume(&mut self, reply: &ReplySlot<u8>) {
        let volume = self.state.volume;
        if self.state.state().is_active() {
            self.backend_command("set_volume", self.backend.set_volume(volume).await);
        } else {
            debug!("Volume {} deferred until playback starts", volume);
            self.state.pending_volume = true;
        }
        reply.publish(volume);
    }

    pub(super) async fn query_playlist(&mut self, reply: &ReplySlot<PlaylistSnapshot>) -> Result<()> {
        let snapshot = PlaylistSnapshot {
            playlist: self.state.playlist.clone(),
            index: self.state.index,
            position: self.current_position().await?,
            state: self.state.state(),
        };
        reply.publish(snapshot);
        Ok(())
    }

    pub(super) async fn quit(&mut self) {
        info!("Quitting player");
        self.backend_command("quit", self.backend.quit().await);
        self.resolver.quit().await;
    }
}
