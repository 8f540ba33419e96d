//! State machine transitions and backend event interpretation
//!
//! **Responsibilities:**
//! - Interpreting backend events against the current phase
//! - Finalizing transitions and emitting state-change notifications
//! - Resolving the reported position (backend query or pending position)

use super::core::PlayerCore;
use crate::backend::{BackendEvent, BackendResult};
use crate::error::Result;
use crate::playback::state::{Phase, Resume};
use std::time::Duration;
use tracing::{debug, info, warn};
use tubecast_common::StateChange;

impl PlayerCore {
    pub(super) async fn handle_backend_event(&mut self, event: BackendEvent) -> Result<()> {
        debug!("Backend event {:?} while {}", event, self.state.state());
        match event {
            BackendEvent::Playing | BackendEvent::Paused if self.state.phase == Phase::Stopped => {
                // Report for a stream that was stopped before it started
                debug!("Backend {:?} while stopped - ignoring", event);
                Ok(())
            }
            BackendEvent::Playing => self.backend_playing().await,
            BackendEvent::Paused => {
                if matches!(self.state.phase, Phase::Buffering { .. }) {
                    // Paused while the next track is still loading
                    return Ok(());
                }
                self.settle(Phase::Paused, None).await
            }
            BackendEvent::Stopped => match self.state.phase {
                // Stopping the previous track is a by-product of loading the next one
                Phase::Buffering { .. } => Ok(()),
                Phase::Stopped => {
                    debug!("Backend stopped while already stopped - ignoring");
                    Ok(())
                }
                // Track ended (or was stopped): there may be more videos
                _ => self.advance().await,
            },
        }
    }

    /// Backend started playing: playback start, resume, or seek completion
    async fn backend_playing(&mut self) -> Result<()> {
        if self.state.pending_volume {
            self.state.pending_volume = false;
            let volume = self.state.volume;
            self.backend_command("set_volume", self.backend.set_volume(volume).await);
        }

        let Phase::Seeking {
            previous, queued, ..
        } = self.state.phase
        else {
            return self.settle(Phase::Playing, None).await;
        };

        match queued {
            Some(target) if target != previous => {
                // Go back to the pre-seek state silently; the command below
                // makes the backend report the requested state.
                self.state.phase = previous.into();
                match target {
                    Resume::Playing => {
                        self.backend_command("resume", self.backend.resume().await)
                    }
                    Resume::Paused => self.backend_command("pause", self.backend.pause().await),
                }
                Ok(())
            }
            _ => self.settle(previous.into(), None).await,
        }
    }

    /// Move to a settled phase and emit the change.
    ///
    /// `position` of `None` means "ask the backend". Leaving Seeking for
    /// Playing or Paused reports the seek target instead.
    pub(super) async fn settle(&mut self, phase: Phase, position: Option<Duration>) -> Result<()> {
        let position = match (&self.state.phase, &phase) {
            (_, Phase::Stopped) => Some(position.unwrap_or(Duration::ZERO)),
            (Phase::Seeking { position: target, .. }, _) => Some(*target),
            _ => position,
        };

        self.state.phase = phase;

        let position = match position {
            Some(position) => position,
            None => self.current_position().await?,
        };
        self.emit(position);
        Ok(())
    }

    pub(super) fn enter_buffering(&mut self, position: Duration) {
        self.state.phase = Phase::Buffering { position };
        self.emit(position);
    }

    /// Start a seek from Playing or Paused
    pub(super) fn enter_seeking(&mut self, position: Duration) {
        let Some(previous) = self.state.phase.as_resume() else {
            warn!("Seek requested while {}", self.state.state());
            return;
        };
        self.state.phase = Phase::Seeking {
            position,
            previous,
            queued: None,
        };
        self.emit(position);
    }

    /// Position of the current track as it should be reported right now
    pub(super) async fn current_position(&self) -> Result<Duration> {
        match self.state.phase {
            Phase::Stopped => Ok(Duration::ZERO),
            Phase::Buffering { position } | Phase::Seeking { position, .. } => Ok(position),
            Phase::Playing | Phase::Paused => self.backend.get_position().await.map_err(|e| {
                Self::violation(format!(
                    "backend position unavailable while {}: {}",
                    self.state.state(),
                    e
                ))
            }),
        }
    }

    fn emit(&self, position: Duration) {
        let change = StateChange::new(self.state.state(), position);
        info!("State change: {}", change);
        if self.events.send(change).is_err() {
            debug!("No state-change listener");
        }
    }

    /// Log a failed fire-and-forget backend command
    pub(super) fn backend_command(&self, command: &str, result: BackendResult<()>) {
        if let Err(e) = result {
            warn!("Backend {} failed: {}", command, e);
        }
    }
}
