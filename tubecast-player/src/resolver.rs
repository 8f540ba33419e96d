//! Stream resolver contract
//!
//! Maps a video identifier to a playable stream URL. Resolution may be slow;
//! the player never awaits it on its control loop.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Trait for stream URL resolution.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolves `video_id` to a stream URL.
    ///
    /// `None` means the video could not be resolved.
    async fn resolve(&self, video_id: &str) -> Option<String>;

    /// Releases resolver resources. Called once when the player quits.
    async fn quit(&self) {}
}

/// Resolver backed by a fixed id -> URL table
///
/// Ids missing from the table resolve through `fallback_template` when one is
/// set (`{id}` is replaced by the video id), and to nothing otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    streams: HashMap<String, String>,
    fallback_template: Option<String>,
}

impl StaticResolver {
    pub fn new(streams: HashMap<String, String>) -> Self {
        Self {
            streams,
            fallback_template: None,
        }
    }

    /// Resolve unknown ids by substituting them into `template`
    pub fn with_fallback(mut self, template: impl Into<String>) -> Self {
        self.fallback_template = Some(template.into());
        self
    }
}

#[async_trait]
impl StreamResolver for StaticResolver {
    async fn resolve(&self, video_id: &str) -> Option<String> {
        let url = self.streams.get(video_id).cloned().or_else(|| {
            self.fallback_template
                .as_ref()
                .map(|template| template.replace("{id}", video_id))
        });
        debug!("Resolved {} -> {:?}", video_id, url);
        url.filter(|url| !url.is_empty())
    }
}
