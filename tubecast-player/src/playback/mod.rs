//! Player engine and play state

pub mod engine;
pub mod reply;
pub mod state;

pub use engine::MediaPlayer;
pub use reply::{ReplyReceiver, ReplySlot};
pub use state::{Phase, PlayState, Resume};
