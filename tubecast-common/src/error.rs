//! Common error types for tubecast

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for tubecast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by tubecast crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
