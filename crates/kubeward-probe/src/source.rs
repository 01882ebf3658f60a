//! The signal-source seam.
//!
//! A source does pure I/O: one query per `sample()` call, bounded by its
//! own timeout, never retried internally. Retrying is the scheduler's job.

use std::future::Future;
use std::pin::Pin;

use kubeward_core::HealthSample;

use crate::error::{SetupError, SourceResult};

/// Boxed future returned by [`SignalSource::sample`].
pub type SampleFuture<'a> = Pin<Box<dyn Future<Output = SourceResult<HealthSample>> + Send + 'a>>;

/// Something that can report the current health of a set of targets.
pub trait SignalSource: Send + Sync {
    /// Short name for logs ("inventory", "prometheus", ...).
    fn name(&self) -> &str;

    /// Take one fresh sample.
    fn sample(&self) -> SampleFuture<'_>;
}

/// Validate a `host:port` address.
pub(crate) fn check_address(address: &str) -> Result<(), SetupError> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(SetupError::Address {
            address: address.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_validation() {
        assert!(check_address("127.0.0.1:9090").is_ok());
        assert!(check_address("prometheus.monitoring.svc:9090").is_ok());
        assert!(check_address("localhost").is_err());
        assert!(check_address(":80").is_err());
        assert!(check_address("host:http").is_err());
    }
}
