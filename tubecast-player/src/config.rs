//! Configuration for the tubecast player
//!
//! Loaded from a TOML file (see `tubecast_common::config` for discovery).
//! Every field has a built-in default, so an empty or missing file is valid.
//!
//! ```toml
//! prefetch_delay_ms = 10000
//! stream_url_ttl_secs = 3600
//!
//! [logging]
//! level = "debug"
//!
//! [simulation]
//! track_length_secs = 30
//! initial_volume = 80
//!
//! [streams]
//! dQw4w9WgXcQ = "https://media.example/dQw4w9WgXcQ.mp4"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Player configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Delay between a track starting and its successor being prefetched
    pub prefetch_delay_ms: u64,

    /// Maximum age of a prefetched stream URL
    pub stream_url_ttl_secs: u64,

    pub logging: LoggingConfig,

    pub simulation: SimulationConfig,

    /// Static video id -> stream URL table
    pub streams: HashMap<String, String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// Simulated backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of every simulated track
    pub track_length_secs: u64,

    /// Volume the simulated backend reports at startup
    pub initial_volume: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            prefetch_delay_ms: 10_000,
            stream_url_ttl_secs: 3_600,
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
            streams: HashMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            track_length_secs: 30,
            initial_volume: 80,
        }
    }
}

impl PlayerConfig {
    /// Load config from `path`, falling back to defaults if it does not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = tubecast_common::config::load_toml(path)?;
        Ok(config.validated())
    }

    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }

    pub fn stream_url_ttl(&self) -> Duration {
        Duration::from_secs(self.stream_url_ttl_secs)
    }

    fn validated(mut self) -> Self {
        self.simulation.initial_volume = self.simulation.initial_volume.min(100);
        if self.simulation.track_length_secs == 0 {
            tracing::warn!("simulation.track_length_secs = 0 is invalid, using 1");
            self.simulation.track_length_secs = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.prefetch_delay(), Duration::from_secs(10));
        assert_eq!(config.stream_url_ttl(), Duration::from_secs(3600));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.simulation.initial_volume, 80);
        assert!(config.streams.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "prefetch_delay_ms = 500\n\n[streams]\nabc = \"https://media.example/abc\""
        )
        .unwrap();

        let config = PlayerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.prefetch_delay(), Duration::from_millis(500));
        assert_eq!(config.stream_url_ttl_secs, 3_600);
        assert_eq!(
            config.streams.get("abc").map(String::as_str),
            Some("https://media.example/abc")
        );
    }

    #[test]
    fn test_out_of_range_values_are_corrected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[simulation]\ntrack_length_secs = 0\ninitial_volume = 250"
        )
        .unwrap();

        let config = PlayerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.simulation.track_length_secs, 1);
        assert_eq!(config.simulation.initial_volume, 100);
    }
}
