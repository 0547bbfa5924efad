use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use xair_protocol::{EncodeError, ValidationError};

/// Socket-level failures. Never retried inside the crate.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} did not resolve to any address")]
    NoAddress(String),
    #[error("failed to open UDP socket: {0}")]
    Bind(#[source] io::Error),
    #[error("failed to send to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum RecallError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("mixer connection not initialised")]
    NotReady,
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Discovery only fails before collection starts. Silence from the mixer
/// is an empty result, not an error.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum SceneMapError {
    #[error("invalid JSON in scene mapping: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("scene mapping must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
