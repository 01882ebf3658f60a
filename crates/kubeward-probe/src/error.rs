//! Error types for signal sources and client setup.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

/// A single sample attempt failed. Recoverable: the loop logs it and polls again.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("http request to {uri} failed: {reason}")]
    Http { uri: String, reason: String },

    #[error("http request to {uri} returned {status}")]
    HttpStatus { uri: String, status: http::StatusCode },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("query status {0:?}")]
    QueryStatus(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Malformed(e.to_string())
    }
}

/// The control-plane client could not be built. Fatal: no polling starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("kubectl is not usable: {0}")]
    Kubectl(#[source] SourceError),

    #[error("invalid address {address:?}: expected host:port")]
    Address { address: String },

    #[error(transparent)]
    Config(#[from] kubeward_core::ConfigError),
}
