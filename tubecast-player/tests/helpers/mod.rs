//! Test helpers for tubecast-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockBackend: records backend commands, lets tests inject backend events
//! - ScriptedResolver: per-id resolution results with optional completion gates
//! - Harness: a started player plus its event stream and control loop task

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tubecast_common::{PlayerState, PlaylistSnapshot, StateChange};
use tubecast_player::{
    Backend, BackendError, BackendEvent, MediaPlayer, PlayerConfig, ReplySlot, Result,
    StreamResolver,
};

/// How long a helper waits for the player before failing the test
pub const WAIT: Duration = Duration::from_secs(5);

// ================================================================================================
// MockBackend
// ================================================================================================

/// A backend command as received by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Play {
        url: String,
        start: Duration,
        volume: Option<u8>,
    },
    Pause,
    Resume,
    Stop,
    SetPosition(Duration),
    SetVolume(u8),
    Quit,
}

/// Backend that records every command and only reports what the test injects
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<MockInner>,
}

struct MockInner {
    initial_volume: u8,
    calls: Mutex<Vec<BackendCall>>,
    events: Mutex<Option<mpsc::UnboundedSender<BackendEvent>>>,
    /// Reported by get_position; `None` makes get_position fail
    position: Mutex<Option<Duration>>,
    changed: Notify,
}

impl MockBackend {
    pub fn new(initial_volume: u8) -> Self {
        Self {
            inner: Arc::new(MockInner {
                initial_volume,
                calls: Mutex::new(Vec::new()),
                events: Mutex::new(None),
                position: Mutex::new(Some(Duration::ZERO)),
                changed: Notify::new(),
            }),
        }
    }

    /// Inject a backend event
    pub fn emit(&self, event: BackendEvent) {
        let events = self.inner.events.lock().unwrap();
        events
            .as_ref()
            .expect("backend not initialized or already closed")
            .send(event)
            .expect("player no longer listening");
    }

    /// Close the event stream as a terminating backend would
    pub fn terminate(&self) {
        self.inner.events.lock().unwrap().take();
    }

    pub fn set_position(&self, position: Option<Duration>) {
        *self.inner.position.lock().unwrap() = position;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.inner.calls.lock().unwrap().clear();
    }

    /// URLs passed to `play`, in order
    pub fn played_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Play { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Wait until the recorded commands satisfy `condition`
    pub async fn wait_for(&self, condition: impl Fn(&[BackendCall]) -> bool) {
        let waiting = async {
            loop {
                let notified = self.inner.changed.notified();
                if condition(self.inner.calls.lock().unwrap().as_slice()) {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT, waiting)
            .await
            .unwrap_or_else(|_| panic!("backend calls never matched: {:?}", self.calls()));
    }

    /// Wait until `play` has been called `count` times in total
    pub async fn wait_for_plays(&self, count: usize) {
        self.wait_for(|calls| {
            calls
                .iter()
                .filter(|call| matches!(call, BackendCall::Play { .. }))
                .count()
                >= count
        })
        .await;
    }

    fn record(&self, call: BackendCall) {
        self.inner.calls.lock().unwrap().push(call);
        self.inner.changed.notify_waiters();
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn initialize(
        &self,
    ) -> std::result::Result<(mpsc::UnboundedReceiver<BackendEvent>, u8), BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.events.lock().unwrap() = Some(tx);
        Ok((rx, self.inner.initial_volume))
    }

    async fn play(
        &self,
        stream_url: &str,
        start: Duration,
        volume: Option<u8>,
    ) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::Play {
            url: stream_url.to_string(),
            start,
            volume,
        });
        Ok(())
    }

    async fn pause(&self) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::Pause);
        Ok(())
    }

    async fn resume(&self) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::Resume);
        Ok(())
    }

    async fn stop(&self) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::Stop);
        Ok(())
    }

    async fn set_position(&self, position: Duration) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::SetPosition(position));
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::SetVolume(volume));
        Ok(())
    }

    async fn get_position(&self) -> std::result::Result<Duration, BackendError> {
        self.inner
            .position
            .lock()
            .unwrap()
            .ok_or(BackendError::NotLoaded)
    }

    async fn quit(&self) -> std::result::Result<(), BackendError> {
        self.record(BackendCall::Quit);
        self.terminate();
        Ok(())
    }
}

// ================================================================================================
// ScriptedResolver
// ================================================================================================

/// Resolver returning `stream://<id>` unless scripted otherwise
#[derive(Default)]
pub struct ScriptedResolver {
    results: Mutex<HashMap<String, Option<String>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<String>>,
    quit_called: Mutex<bool>,
}

impl ScriptedResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn url_for(video_id: &str) -> String {
        format!("stream://{}", video_id)
    }

    /// Make `video_id` resolve to `url` (`None` = resolution failure)
    pub fn script(&self, video_id: &str, url: Option<&str>) {
        self.results
            .lock()
            .unwrap()
            .insert(video_id.to_string(), url.map(str::to_string));
    }

    /// Hold resolutions of `video_id` until the returned gate is notified.
    /// Each `notify_one` releases one resolution.
    pub fn gate(&self, video_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(video_id.to_string(), Arc::clone(&gate));
        gate
    }

    /// Video ids resolution was requested for, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn quit_called(&self) -> bool {
        *self.quit_called.lock().unwrap()
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    async fn resolve(&self, video_id: &str) -> Option<String> {
        self.requests.lock().unwrap().push(video_id.to_string());
        let gate = self.gates.lock().unwrap().get(video_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.results
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .unwrap_or_else(|| Some(Self::url_for(video_id)))
    }

    async fn quit(&self) {
        *self.quit_called.lock().unwrap() = true;
    }
}

// ================================================================================================
// Harness
// ================================================================================================

/// A running player wired to a [`MockBackend`] and a [`ScriptedResolver`]
pub struct Harness {
    pub player: MediaPlayer,
    pub events: mpsc::UnboundedReceiver<StateChange>,
    pub task: JoinHandle<Result<()>>,
    pub backend: MockBackend,
    pub resolver: Arc<ScriptedResolver>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(MockBackend::new(50), ScriptedResolver::new(), PlayerConfig::default())
            .await
    }

    pub async fn start_with(
        backend: MockBackend,
        resolver: Arc<ScriptedResolver>,
        config: PlayerConfig,
    ) -> Self {
        let (player, events, task) = MediaPlayer::start(
            Arc::new(backend.clone()),
            resolver.clone() as Arc<dyn StreamResolver>,
            &config,
        )
        .await
        .expect("player failed to start");

        Self {
            player,
            events,
            task,
            backend,
            resolver,
        }
    }

    /// Next emitted state change
    pub async fn next_change(&mut self) -> StateChange {
        tokio::time::timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for a state change")
            .expect("event stream closed")
    }

    /// Assert the next state change is `state` at `position`
    pub async fn expect_change(&mut self, state: PlayerState, position: Duration) {
        let change = self.next_change().await;
        assert_eq!(
            (change.state, change.position),
            (state, position),
            "unexpected state change {}",
            change
        );
    }

    /// Wait until every request and backend event issued so far has been handled
    pub async fn sync(&self) {
        let (reply, mut rx) = ReplySlot::new();
        self.player.query_volume(&reply);
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("player did not answer")
            .expect("player stopped");
    }

    pub fn assert_no_change(&mut self) {
        if let Ok(change) = self.events.try_recv() {
            panic!("unexpected state change {}", change);
        }
    }

    pub async fn snapshot(&self) -> PlaylistSnapshot {
        let (reply, mut rx) = ReplySlot::new();
        self.player.query_playlist(&reply);
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("player did not answer")
            .expect("player stopped")
    }

    /// Set `playlist` at `index` and drive the track to Playing
    pub async fn start_playing(&mut self, playlist: &[&str], index: usize) {
        let plays = self.backend.played_urls().len();
        self.player
            .set_playlist(ids(playlist), index, Duration::ZERO)
            .await;
        self.expect_change(PlayerState::Buffering, Duration::ZERO).await;
        self.backend.wait_for_plays(plays + 1).await;
        self.backend.emit(BackendEvent::Playing);
        self.expect_change(PlayerState::Playing, Duration::ZERO).await;
    }

    /// Wait for the control loop to finish and return its outcome
    pub async fn join(self) -> Result<()> {
        tokio::time::timeout(WAIT, self.task)
            .await
            .expect("player did not stop")
            .expect("player task panicked")
    }
}

pub fn ids(playlist: &[&str]) -> Vec<String> {
    playlist.iter().map(|id| id.to_string()).collect()
}

pub fn secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
