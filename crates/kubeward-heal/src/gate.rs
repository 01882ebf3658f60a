//! Bounded readiness gate.
//!
//! Polls a signal source until the filtered sample has no unhealthy
//! targets (`Converged`) or the attempt budget runs out (`TimedOut`).
//!
//! ```text
//! Polling ──empty unhealthy set──▶ Converged
//!    │
//!    └──attempts ≥ max_attempts──▶ TimedOut
//! ```
//!
//! A failed sample counts as an attempt like any still-unhealthy tick.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use kubeward_core::{PollOutcome, TargetFilter, UnhealthySet, classify};
use kubeward_metrics::Recorder;
use kubeward_probe::SignalSource;

/// Attempt budget and cadence for the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// The filtered sample must hold at least this many targets to converge.
    pub min_targets: usize,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay: Duration::from_secs(15),
            min_targets: 0,
        }
    }
}

pub struct ReadinessGate {
    source: Arc<dyn SignalSource>,
    filter: TargetFilter,
    policy: GatePolicy,
    metrics: Arc<Recorder>,
}

impl ReadinessGate {
    pub fn new(
        source: Arc<dyn SignalSource>,
        filter: TargetFilter,
        policy: GatePolicy,
        metrics: Arc<Recorder>,
    ) -> Self {
        Self {
            source,
            filter,
            policy,
            metrics,
        }
    }

    pub fn filter(&self) -> &TargetFilter {
        &self.filter
    }

    /// Poll until convergence or timeout.
    pub async fn run(&self) -> PollOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut unhealthy = UnhealthySet::new();
        let mut last_sample = None;

        loop {
            self.metrics.record_check();

            match self.source.sample().await {
                Ok(sample) => {
                    let filtered = self.filter.apply(&sample);
                    unhealthy = classify(&filtered);
                    let enough = filtered.len() >= self.policy.min_targets;

                    info!(
                        source = self.source.name(),
                        unhealthy = unhealthy.len(),
                        targets = filtered.len(),
                        attempt = attempt + 1,
                        max_attempts,
                        "readiness check"
                    );

                    if unhealthy.is_empty() && enough {
                        info!(attempts = attempt + 1, "all targets ready");
                        return PollOutcome::Converged {
                            attempts: attempt + 1,
                        };
                    }
                    if !enough {
                        info!(
                            targets = filtered.len(),
                            min_targets = self.policy.min_targets,
                            "waiting for targets to appear"
                        );
                    }
                    last_sample = Some(sample);
                }
                Err(e) => {
                    warn!(
                        source = self.source.name(),
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts,
                        "sample unavailable"
                    );
                }
            }

            attempt += 1;
            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    unhealthy = unhealthy.len(),
                    "targets failed to become ready in time"
                );
                return PollOutcome::TimedOut {
                    attempts: attempt,
                    unhealthy,
                    last_sample,
                };
            }

            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
