//! Error types for remediation.

use thiserror::Error;

use kubeward_probe::SourceError;

/// One corrective action failed. Recoverable: counted, never retried
/// within the tick, and naturally retried on the next detection.
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("workload {0} not found")]
    NotFound(String),

    #[error("restart of {target} rejected: {reason}")]
    Rejected { target: String, reason: String },

    #[error("restart of {target} could not be issued: {source}")]
    Unavailable {
        target: String,
        #[source]
        source: SourceError,
    },
}
