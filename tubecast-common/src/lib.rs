//! # Tubecast Common Library
//!
//! Shared code for the tubecast player and anything that drives it:
//! - Player state and state-change event types
//! - Playlist snapshot type returned by playlist queries
//! - Configuration file discovery
//! - Time and position helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{PlayerState, PlaylistSnapshot, StateChange};
