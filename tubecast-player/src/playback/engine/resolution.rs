//! Stream resolution and prefetch orchestration
//!
//! **Responsibilities:**
//! - Starting a track: enter Buffering, then resolve its stream off-loop
//! - Applying resolution results that are still wanted, discarding the rest
//! - Advancing to the next track (natural end or failed resolution)
//! - Prefetching the next track's stream behind a delay gate
//!
//! Background tasks never touch the play state. They send their result back
//! through the request channel and the handler re-validates it there.

use super::core::{Command, PlayerCore, Request};
use crate::error::Result;
use crate::playback::state::{Phase, PrefetchedStream};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl PlayerCore {
    /// Start playing the current track at `position`
    pub(super) async fn start_playing(&mut self, position: Duration) -> Result<()> {
        let Some(video_id) = self.state.current_video().map(str::to_owned) else {
            return Err(Self::violation("start playing without a current video"));
        };

        if self.state.phase == Phase::Playing {
            // Stop the old track right away instead of letting it run while
            // the new stream is being resolved
            self.backend_command("stop", self.backend.stop().await);
        }
        self.enter_buffering(position);

        self.load_ticket += 1;
        let ticket = self.load_ticket;

        if let Some(url) = self.state.take_prefetched(&video_id, self.stream_url_ttl) {
            debug!("Using prefetched stream for {}", video_id);
            self.play_stream(&video_id, &url, position).await;
            return Ok(());
        }

        info!("Resolving stream for {}", video_id);
        let resolver = self.resolver.clone();
        let requests = self.requests.clone();
        tokio::spawn(async move {
            let url = resolver.resolve(&video_id).await;
            send_back(
                &requests,
                Command::StreamResolved {
                    video_id,
                    ticket,
                    position,
                    url,
                },
            );
        });
        Ok(())
    }

    /// Apply a resolution result if its track is still the one wanted
    pub(super) async fn stream_resolved(
        &mut self,
        video_id: String,
        ticket: u64,
        position: Duration,
        url: Option<String>,
    ) -> Result<()> {
        if ticket != self.load_ticket || self.state.current_video() != Some(video_id.as_str()) {
            info!("Video {} isn't needed anymore", video_id);
            return Ok(());
        }
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            warn!("Empty stream URL for {}, skipping to next video", video_id);
            return self.advance().await;
        };

        if !matches!(self.state.phase, Phase::Buffering { .. }) {
            // A late report for the previous track moved us out of Buffering;
            // the new stream is still wanted, so wait for it to start again
            debug!(
                "Stream for {} arrived while {}, back to buffering",
                video_id,
                self.state.state()
            );
            self.enter_buffering(position);
        }

        self.play_stream(&video_id, &url, position).await;
        Ok(())
    }

    /// Hand a resolved stream to the backend, then queue the successor's prefetch
    async fn play_stream(&mut self, video_id: &str, url: &str, position: Duration) {
        let volume = if self.state.pending_volume {
            self.state.pending_volume = false;
            Some(self.state.volume)
        } else {
            None
        };

        info!("Playing {} from {:?}", video_id, position);
        self.backend_command("play", self.backend.play(url, position, volume).await);

        self.schedule_prefetch(self.state.next_video().map(str::to_owned));
    }

    /// Move to the next track, or stop at the end of the playlist.
    ///
    /// The playlist is kept when the end is reached.
    pub(super) async fn advance(&mut self) -> Result<()> {
        if self.state.index + 1 < self.state.playlist.len() {
            self.state.index += 1;
            // Nothing is playing anymore: keep start_playing from stopping the backend
            self.state.phase = Phase::Stopped;
            self.start_playing(Duration::ZERO).await
        } else {
            self.settle(Phase::Stopped, Some(Duration::ZERO)).await
        }
    }

    /// Prefetch `video_id` once the delay gate has passed
    pub(super) fn schedule_prefetch(&self, video_id: Option<String>) {
        let Some(video_id) = video_id else {
            return;
        };
        let delay = self.prefetch_delay;
        let requests = self.requests.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            send_back(&requests, Command::PrefetchDue { video_id });
        });
    }

    pub(super) fn prefetch_due(&mut self, video_id: String) {
        if self.state.next_video() != Some(video_id.as_str()) {
            debug!("Prefetch of {} skipped: playlist changed", video_id);
            return;
        }
        if self.state.has_prefetched(&video_id, self.stream_url_ttl) {
            debug!("Stream for {} already prefetched", video_id);
            return;
        }

        debug!("Prefetching stream for {}", video_id);
        let resolver = self.resolver.clone();
        let requests = self.requests.clone();
        tokio::spawn(async move {
            let url = resolver.resolve(&video_id).await;
            send_back(&requests, Command::PrefetchResolved { video_id, url });
        });
    }

    pub(super) fn prefetch_resolved(&mut self, video_id: String, url: Option<String>) {
        if self.state.next_video() != Some(video_id.as_str()) {
            debug!("Prefetched stream for {} no longer needed", video_id);
            return;
        }
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            debug!("Prefetch of {} failed", video_id);
            return;
        };
        self.state.prefetched = Some(PrefetchedStream {
            video_id,
            url,
            resolved_at: Instant::now(),
        });
    }
}

/// Hand a background result back to the control loop.
///
/// A closed channel means the player is gone and the result is moot.
fn send_back(requests: &tokio::sync::mpsc::UnboundedSender<Request>, command: Command) {
    let _ = requests.send(Request {
        command,
        done: None,
    });
}
