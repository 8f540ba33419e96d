//! Simulated playback backend
//!
//! A timer-driven stand-in for a real media player process. It decodes
//! nothing; it keeps a virtual play head per loaded stream and reports state
//! the way a real backend does:
//! - `Playing` after play, resume and every seek
//! - `Paused` after pause
//! - `Stopped` after stop, when a new stream replaces a loaded one, and when
//!   the configured track length elapses
//!
//! Used by the `tubecast-player` binary to exercise the player end to end.

use crate::backend::{Backend, BackendEvent, BackendResult};
use crate::error::BackendError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Backend that plays every stream for a fixed length of time
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    track_length: Duration,
    initial_volume: u8,
    shared: Arc<Mutex<SimState>>,
}

#[derive(Debug, Default)]
struct SimState {
    events: Option<mpsc::UnboundedSender<BackendEvent>>,
    loaded: Option<Loaded>,
    volume: u8,
    /// Bumped whenever the end-of-track timer must be invalidated
    timer_generation: u64,
}

#[derive(Debug)]
struct Loaded {
    url: String,
    /// Play head at `started_at` (or the frozen play head while paused)
    offset: Duration,
    /// `None` while paused
    started_at: Option<Instant>,
}

impl Loaded {
    fn position(&self, track_length: Duration) -> Duration {
        let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        (self.offset + elapsed).min(track_length)
    }
}

impl SimState {
    fn emit(&self, event: BackendEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl SimulatedBackend {
    pub fn new(track_length: Duration, initial_volume: u8) -> Self {
        Self {
            track_length,
            initial_volume: initial_volume.min(100),
            shared: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Current volume as last set by the player
    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    /// URL of the loaded stream, if any
    pub fn loaded_url(&self) -> Option<String> {
        self.lock().loaded.as_ref().map(|l| l.url.clone())
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the end-of-track timer for the running stream
    fn schedule_end(&self, state: &mut SimState, remaining: Duration) {
        state.timer_generation += 1;
        let generation = state.timer_generation;
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.timer_generation != generation {
                return;
            }
            if let Some(loaded) = state.loaded.take() {
                info!("Simulated track finished: {}", loaded.url);
                state.emit(BackendEvent::Stopped);
            }
        });
    }

    fn cancel_end(state: &mut SimState) {
        state.timer_generation += 1;
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    async fn initialize(&self) -> BackendResult<(mpsc::UnboundedReceiver<BackendEvent>, u8)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.events = Some(tx);
        state.volume = self.initial_volume;
        Ok((rx, self.initial_volume))
    }

    async fn play(&self, stream_url: &str, start: Duration, volume: Option<u8>) -> BackendResult<()> {
        let mut state = self.lock();
        if state.events.is_none() {
            return Err(BackendError::Unavailable);
        }
        if let Some(volume) = volume {
            state.volume = volume;
        }
        if state.loaded.take().is_some() {
            Self::cancel_end(&mut state);
            state.emit(BackendEvent::Stopped);
        }

        let start = start.min(self.track_length);
        debug!("Simulated play {} from {:?}", stream_url, start);
        state.loaded = Some(Loaded {
            url: stream_url.to_string(),
            offset: start,
            started_at: Some(Instant::now()),
        });
        self.schedule_end(&mut state, self.track_length - start);
        state.emit(BackendEvent::Playing);
        Ok(())
    }

    async fn pause(&self) -> BackendResult<()> {
        let mut state = self.lock();
        let track_length = self.track_length;
        let loaded = state.loaded.as_mut().ok_or(BackendError::NotLoaded)?;
        if loaded.started_at.is_some() {
            loaded.offset = loaded.position(track_length);
            loaded.started_at = None;
            Self::cancel_end(&mut state);
        }
        state.emit(BackendEvent::Paused);
        Ok(())
    }

    async fn resume(&self) -> BackendResult<()> {
        let mut state = self.lock();
        let loaded = state.loaded.as_mut().ok_or(BackendError::NotLoaded)?;
        if loaded.started_at.is_none() {
            loaded.started_at = Some(Instant::now());
            let remaining = self.track_length.saturating_sub(loaded.offset);
            self.schedule_end(&mut state, remaining);
        }
        state.emit(BackendEvent::Playing);
        Ok(())
    }

    async fn stop(&self) -> BackendResult<()> {
        let mut state = self.lock();
        Self::cancel_end(&mut state);
        if state.loaded.take().is_some() {
            state.emit(BackendEvent::Stopped);
        }
        Ok(())
    }

    async fn set_position(&self, position: Duration) -> BackendResult<()> {
        let mut state = self.lock();
        let track_length = self.track_length;
        let loaded = state.loaded.as_mut().ok_or(BackendError::NotLoaded)?;
        loaded.offset = position.min(track_length);
        let running = loaded.started_at.is_some();
        let remaining = track_length - loaded.offset;
        if running {
            loaded.started_at = Some(Instant::now());
            self.schedule_end(&mut state, remaining);
        }
        // Seek completion is reported as playing, even when paused
        state.emit(BackendEvent::Playing);
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> BackendResult<()> {
        self.lock().volume = volume.min(100);
        Ok(())
    }

    async fn get_position(&self) -> BackendResult<Duration> {
        let state = self.lock();
        state
            .loaded
            .as_ref()
            .map(|l| l.position(self.track_length))
            .ok_or(BackendError::NotLoaded)
    }

    async fn quit(&self) -> BackendResult<()> {
        let mut state = self.lock();
        Self::cancel_end(&mut state);
        state.loaded = None;
        // Dropping the sender closes the event stream
        state.events = None;
        info!("Simulated backend quit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_track_ends_after_length() {
        let backend = SimulatedBackend::new(Duration::from_secs(30), 80);
        let (mut events, volume) = backend.initialize().await.unwrap();
        assert_eq!(volume, 80);

        backend.play("sim://a", Duration::from_secs(10), None).await.unwrap();
        assert_eq!(events.recv().await, Some(BackendEvent::Playing));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(backend.get_position().await.unwrap(), Duration::from_secs(15));

        assert_eq!(events.recv().await, Some(BackendEvent::Stopped));
        assert!(backend.get_position().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_position() {
        let backend = SimulatedBackend::new(Duration::from_secs(30), 80);
        let (mut events, _) = backend.initialize().await.unwrap();

        backend.play("sim://a", Duration::ZERO, None).await.unwrap();
        assert_eq!(events.recv().await, Some(BackendEvent::Playing));
        tokio::time::advance(Duration::from_secs(4)).await;

        backend.pause().await.unwrap();
        assert_eq!(events.recv().await, Some(BackendEvent::Paused));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(backend.get_position().await.unwrap(), Duration::from_secs(4));
        assert!(events.try_recv().is_err(), "paused track must not end");
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_reports_playing() {
        let backend = SimulatedBackend::new(Duration::from_secs(30), 80);
        let (mut events, _) = backend.initialize().await.unwrap();

        backend.play("sim://a", Duration::ZERO, None).await.unwrap();
        events.recv().await;
        backend.pause().await.unwrap();
        events.recv().await;

        backend.set_position(Duration::from_secs(20)).await.unwrap();
        assert_eq!(events.recv().await, Some(BackendEvent::Playing));
        assert_eq!(backend.get_position().await.unwrap(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_replaces_loaded_stream() {
        let backend = SimulatedBackend::new(Duration::from_secs(30), 80);
        let (mut events, _) = backend.initialize().await.unwrap();

        backend.play("sim://a", Duration::ZERO, None).await.unwrap();
        events.recv().await;
        backend.play("sim://b", Duration::ZERO, Some(40)).await.unwrap();

        assert_eq!(events.recv().await, Some(BackendEvent::Stopped));
        assert_eq!(events.recv().await, Some(BackendEvent::Playing));
        assert_eq!(backend.loaded_url().as_deref(), Some("sim://b"));
        assert_eq!(backend.volume(), 40);
    }

    #[tokio::test]
    async fn test_quit_closes_event_stream() {
        let backend = SimulatedBackend::new(Duration::from_secs(30), 80);
        let (mut events, _) = backend.initialize().await.unwrap();

        backend.quit().await.unwrap();
        assert_eq!(events.recv().await, None);
    }
}
