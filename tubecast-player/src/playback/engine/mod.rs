//! Player engine - single owner of the play state
//!
//! **Module Structure:**
//! - `core.rs`: Control loop, request types, dispatch, shutdown
//! - `handle.rs`: Public `MediaPlayer` handle
//! - `commands.rs`: Caller commands and queries
//! - `transitions.rs`: State machine, backend event interpretation, emission
//! - `resolution.rs`: Stream resolution, track advance, prefetch

mod commands;
mod core;
mod handle;
mod resolution;
mod transitions;

pub use handle::MediaPlayer;
