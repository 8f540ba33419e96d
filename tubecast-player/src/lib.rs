//! # Tubecast Player Library (tubecast-player)
//!
//! Playlist playback coordinator for a cast-style receiver.
//!
//! **Purpose:** Keep a remote-controlled playlist and a media backend in
//! step: resolve video ids to stream URLs, drive the backend through
//! play/pause/seek/stop, prefetch the next track, and report every state
//! change to a listener.
//!
//! **Architecture:** One control loop task owns all play state. Callers,
//! backend events and background resolution results all reach it as
//! messages, so handlers run one at a time in arrival order.

pub mod backend;
pub mod config;
pub mod error;
pub mod playback;
pub mod resolver;
pub mod sim;

pub use backend::{Backend, BackendEvent};
pub use config::PlayerConfig;
pub use error::{BackendError, Error, Result};
pub use playback::{MediaPlayer, ReplyReceiver, ReplySlot};
pub use resolver::{StaticResolver, StreamResolver};
pub use sim::SimulatedBackend;
