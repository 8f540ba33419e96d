//! Control loop - state ownership and request serialization
//!
//! **Responsibilities:**
//! - PlayerCore struct definition and startup
//! - The control loop: interleaves caller requests and backend events
//! - Request dispatch and shutdown (closing the event sink and request channel)
//!
//! Every read or write of [`PlayState`] happens inside one request or event
//! handler running on this loop, so handlers are totally ordered and never
//! overlap.

use crate::backend::{Backend, BackendEvent};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::playback::reply::ReplySlot;
use crate::playback::state::PlayState;
use crate::resolver::StreamResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use tubecast_common::{PlaylistSnapshot, StateChange};

/// Consecutive backend events handled before a waiting request gets a turn
const MAX_BACKEND_STREAK: usize = 16;

/// Operations accepted by the control loop
#[derive(Debug)]
pub(crate) enum Command {
    SetPlaylist {
        playlist: Vec<String>,
        index: usize,
        position: Duration,
    },
    UpdatePlaylist {
        playlist: Vec<String>,
    },
    SetCurrentTrack {
        video_id: String,
        position: Duration,
    },
    Play,
    Pause,
    Seek {
        position: Duration,
    },
    Stop,
    SetVolume {
        volume: i32,
        reply: ReplySlot<u8>,
    },
    ChangeVolume {
        delta: i32,
        reply: ReplySlot<u8>,
    },
    QueryPlaylist {
        reply: ReplySlot<PlaylistSnapshot>,
    },
    QueryVolume {
        reply: ReplySlot<u8>,
    },
    Quit,

    // Results of background work re-entering the loop
    StreamResolved {
        video_id: String,
        ticket: u64,
        position: Duration,
        url: Option<String>,
    },
    PrefetchDue {
        video_id: String,
    },
    PrefetchResolved {
        video_id: String,
        url: Option<String>,
    },
}

/// A command plus the caller's completion signal
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) command: Command,
    /// Fired once the command's handler has run; `None` for fire-and-forget
    pub(crate) done: Option<oneshot::Sender<()>>,
}

/// Owner of the play state; lives on the control loop task
pub(super) struct PlayerCore {
    pub(super) state: PlayState,

    pub(super) backend: Arc<dyn Backend>,

    pub(super) resolver: Arc<dyn StreamResolver>,

    /// Outbound state-change notifications
    pub(super) events: mpsc::UnboundedSender<StateChange>,

    /// Loop-back sender for background resolution and prefetch tasks
    pub(super) requests: mpsc::UnboundedSender<Request>,

    /// Incremented on every track start; resolution results carry the value
    /// they were started with so superseded results can be recognised
    pub(super) load_ticket: u64,

    pub(super) prefetch_delay: Duration,

    pub(super) stream_url_ttl: Duration,
}

impl PlayerCore {
    pub(super) fn new(
        backend: Arc<dyn Backend>,
        resolver: Arc<dyn StreamResolver>,
        config: &PlayerConfig,
        initial_volume: u8,
        events: mpsc::UnboundedSender<StateChange>,
        requests: mpsc::UnboundedSender<Request>,
    ) -> Self {
        Self {
            state: PlayState::new(initial_volume),
            backend,
            resolver,
            events,
            requests,
            load_ticket: 0,
            prefetch_delay: config.prefetch_delay(),
            stream_url_ttl: config.stream_url_ttl(),
        }
    }

    /// Run until the backend terminates or a contract violation occurs.
    ///
    /// On return the event sink is closed (dropped with `self`) and the
    /// request channel is closed, so later requests are silently ignored.
    pub(super) async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut backend_events: mpsc::UnboundedReceiver<BackendEvent>,
    ) -> Result<()> {
        info!("Player control loop started (volume={})", self.state.volume);

        // Backend events handled since the last request
        let mut backend_streak = 0usize;

        let outcome = loop {
            let requests_due = backend_streak >= MAX_BACKEND_STREAK;
            // Backend events first: they report what has already happened.
            // A long run of them yields to one waiting request.
            let step = if requests_due {
                tokio::select! {
                    biased;

                    Some(request) = requests.recv() => {
                        backend_streak = 0;
                        self.handle_request(request).await
                    }
                    event = backend_events.recv() => {
                        let Some(event) = event else {
                            info!("Backend terminated, stopping player");
                            break Ok(());
                        };
                        backend_streak += 1;
                        self.handle_backend_event(event).await
                    }
                }
            } else {
                tokio::select! {
                    biased;

                    event = backend_events.recv() => {
                        let Some(event) = event else {
                            info!("Backend terminated, stopping player");
                            break Ok(());
                        };
                        backend_streak += 1;
                        self.handle_backend_event(event).await
                    }
                    Some(request) = requests.recv() => {
                        backend_streak = 0;
                        self.handle_request(request).await
                    }
                }
            };
            if let Err(e) = step {
                break Err(e);
            }
        };

        if let Err(e) = &outcome {
            error!("Player stopped: {}", e);
        }

        // Pending requests are dropped unanswered; their callers return
        // as if the player had already shut down.
        requests.close();
        while requests.try_recv().is_ok() {}

        info!("Player control loop stopped");
        outcome
    }

    async fn handle_request(&mut self, request: Request) -> Result<()> {
        let result = self.dispatch(request.command).await;
        if let Some(done) = request.done {
            let _ = done.send(());
        }
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!("Handling {:?}", command);
        match command {
            Command::SetPlaylist {
                playlist,
                index,
                position,
            } => self.set_playlist(playlist, index, position).await,
            Command::UpdatePlaylist { playlist } => self.update_playlist(playlist),
            Command::SetCurrentTrack { video_id, position } => {
                self.set_current_track(&video_id, position).await
            }
            Command::Play => self.play().await,
            Command::Pause => self.pause().await,
            Command::Seek { position } => self.seek(position).await,
            Command::Stop => self.stop().await,
            Command::SetVolume { volume, reply } => {
                self.state.set_volume(volume);
                self.apply_volume(&reply).await;
                Ok(())
            }
            Command::ChangeVolume { delta, reply } => {
                self.state.change_volume(delta);
                self.apply_volume(&reply).await;
                Ok(())
            }
            Command::QueryPlaylist { reply } => self.query_playlist(&reply).await,
            Command::QueryVolume { reply } => {
                reply.publish(self.state.volume);
                Ok(())
            }
            Command::Quit => {
                self.quit().await;
                Ok(())
            }
            Command::StreamResolved {
                video_id,
                ticket,
                position,
                url,
            } => self.stream_resolved(video_id, ticket, position, url).await,
            Command::PrefetchDue { video_id } => {
                self.prefetch_due(video_id);
                Ok(())
            }
            Command::PrefetchResolved { video_id, url } => {
                self.prefetch_resolved(video_id, url);
                Ok(())
            }
        }
    }

    /// Build a contract violation, logging it where it is detected
    pub(super) fn violation(message: impl Into<String>) -> Error {
        let message = message.into();
        error!("Contract violation: {}", message);
        Error::ContractViolation(message)
    }
}
