//! Startup error types.
//!
//! Only startup can fail fatally. Accept and relay failures are plain
//! `std::io::Error` values that get logged where they happen.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The listening endpoint could not be created.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("Invalid listen address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl BindError {
    /// Underlying I/O error kind.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            BindError::InvalidAddress { source, .. } | BindError::Bind { source, .. } => {
                source.kind()
            }
        }
    }
}
