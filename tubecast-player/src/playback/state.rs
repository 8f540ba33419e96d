//! Play state aggregate
//!
//! The single mutable record describing what the player should currently be
//! doing. Owned by the control loop; nothing else ever holds a reference to
//! it across an await point outside a request handler.
//!
//! The transitional states carry their resume position inside the variant,
//! so "buffering position is set iff the state is Buffering or Seeking" holds
//! by construction.

use std::time::Duration;
use tokio::time::Instant;
use tubecast_common::PlayerState;

/// Highest volume accepted by the backend
pub const MAX_VOLUME: u8 = 100;

/// State a seek returns to once the backend reports completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Playing,
    Paused,
}

impl From<Resume> for PlayerState {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::Playing => PlayerState::Playing,
            Resume::Paused => PlayerState::Paused,
        }
    }
}

impl From<Resume> for Phase {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::Playing => Phase::Playing,
            Resume::Paused => Phase::Paused,
        }
    }
}

/// Player state machine position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Playing,
    Paused,
    /// Waiting for a stream to be resolved and started
    Buffering { position: Duration },
    /// Waiting for the backend to complete a seek
    Seeking {
        position: Duration,
        /// State held before the seek started
        previous: Resume,
        /// Play/pause requested while the seek was in flight
        queued: Option<Resume>,
    },
}

impl Phase {
    pub fn state(&self) -> PlayerState {
        match self {
            Phase::Stopped => PlayerState::Stopped,
            Phase::Playing => PlayerState::Playing,
            Phase::Paused => PlayerState::Paused,
            Phase::Buffering { .. } => PlayerState::Buffering,
            Phase::Seeking { .. } => PlayerState::Seeking,
        }
    }

    /// Pending resume position; `Some` exactly in Buffering and Seeking
    pub fn buffering_position(&self) -> Option<Duration> {
        match self {
            Phase::Buffering { position } | Phase::Seeking { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The settled state a seek may start from
    pub fn as_resume(&self) -> Option<Resume> {
        match self {
            Phase::Playing => Some(Resume::Playing),
            Phase::Paused => Some(Resume::Paused),
            _ => None,
        }
    }
}

/// Stream URL resolved ahead of time for the next track
#[derive(Debug, Clone)]
pub struct PrefetchedStream {
    pub video_id: String,
    pub url: String,
    pub resolved_at: Instant,
}

/// Where a video id was found in the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub index: usize,
    /// The id appears more than once; `index` is the first occurrence
    pub duplicated: bool,
}

/// The player's mutable state
#[derive(Debug)]
pub struct PlayState {
    pub playlist: Vec<String>,
    /// Kept when the playlist is cleared so a later playlist update can clamp it
    pub index: usize,
    pub phase: Phase,
    pub volume: u8,
    /// Volume changed while nothing was loaded; apply on next playback start
    pub pending_volume: bool,
    pub prefetched: Option<PrefetchedStream>,
}

impl PlayState {
    pub fn new(initial_volume: u8) -> Self {
        Self {
            playlist: Vec::new(),
            index: 0,
            phase: Phase::Stopped,
            volume: initial_volume.min(MAX_VOLUME),
            pending_volume: false,
            prefetched: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.phase.state()
    }

    pub fn current_video(&self) -> Option<&str> {
        self.playlist.get(self.index).map(String::as_str)
    }

    pub fn next_video(&self) -> Option<&str> {
        self.playlist.get(self.index + 1).map(String::as_str)
    }

    /// Find the first occurrence of `video_id`
    pub fn locate(&self, video_id: &str) -> Option<Located> {
        let mut matches = self
            .playlist
            .iter()
            .enumerate()
            .filter(|(_, id)| id.as_str() == video_id)
            .map(|(i, _)| i);

        let index = matches.next()?;
        Some(Located {
            index,
            duplicated: matches.next().is_some(),
        })
    }

    /// Set the absolute volume, clamped to 0-100
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        self.volume = clamp_volume(i64::from(volume));
        self.volume
    }

    /// Shift the volume by `delta`, clamped to 0-100
    pub fn change_volume(&mut self, delta: i32) -> u8 {
        self.volume = clamp_volume(i64::from(self.volume) + i64::from(delta));
        self.volume
    }

    /// Take the prefetched URL for `video_id` if it is younger than `ttl`.
    ///
    /// Entries for other ids are left alone; expired entries are dropped.
    pub fn take_prefetched(&mut self, video_id: &str, ttl: Duration) -> Option<String> {
        if !self
            .prefetched
            .as_ref()
            .is_some_and(|entry| entry.video_id == video_id)
        {
            return None;
        }
        let entry = self.prefetched.take()?;
        (entry.resolved_at.elapsed() < ttl).then_some(entry.url)
    }

    /// Whether a fresh prefetched URL for `video_id` is already cached
    pub fn has_prefetched(&self, video_id: &str, ttl: Duration) -> bool {
        self.prefetched
            .as_ref()
            .is_some_and(|entry| entry.video_id == video_id && entry.resolved_at.elapsed() < ttl)
    }
}

fn clamp_volume(volume: i64) -> u8 {
    volume.clamp(0, i64::from(MAX_VOLUME)) as u8
}
