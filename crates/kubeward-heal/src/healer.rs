//! Continuous healer: detect unhealthy targets and restart them, forever.
//!
//! Every tick recomputes the unhealthy set from a fresh sample and hands
//! each member to the remediator exactly once. There is no memory between
//! ticks: a target that stays unhealthy is simply restarted again next
//! tick, and a restarted process resumes with no recovery step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use kubeward_core::{TargetFilter, classify};
use kubeward_metrics::Recorder;
use kubeward_probe::SignalSource;

use crate::remediate::Remediator;

/// What happened to one unhealthy target on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    Restarted,
    Failed(String),
    /// Detected but left alone (dry run).
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationRecord {
    pub target: String,
    pub outcome: RemediationOutcome,
}

pub struct Healer {
    source: Arc<dyn SignalSource>,
    filter: TargetFilter,
    remediator: Arc<dyn Remediator>,
    metrics: Arc<Recorder>,
    interval: Duration,
    dry_run: bool,
}

impl Healer {
    pub fn new(
        source: Arc<dyn SignalSource>,
        filter: TargetFilter,
        remediator: Arc<dyn Remediator>,
        metrics: Arc<Recorder>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            filter,
            remediator,
            metrics,
            interval,
            dry_run: false,
        }
    }

    /// Detect and log, but never call the remediator.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// One sample → filter → classify → dispatch cycle.
    ///
    /// A failed sample yields no records; the next tick tries again.
    pub async fn tick(&self) -> Vec<RemediationRecord> {
        self.metrics.record_check();

        let sample = match self.source.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "sample unavailable");
                return Vec::new();
            }
        };

        let unhealthy = classify(&self.filter.apply(&sample));
        info!(
            source = self.source.name(),
            unhealthy = unhealthy.len(),
            "checked for failed targets"
        );

        let mut records = Vec::with_capacity(unhealthy.len());
        for target in unhealthy.iter() {
            let outcome = self.dispatch(target).await;
            records.push(RemediationRecord {
                target: target.to_string(),
                outcome,
            });
        }
        records
    }

    async fn dispatch(&self, target: &str) -> RemediationOutcome {
        if self.dry_run {
            info!(%target, "dry run: restart skipped");
            return RemediationOutcome::NotAttempted;
        }

        info!(%target, "restarting workload");
        match self.remediator.restart(target).await {
            Ok(()) => {
                self.metrics.record_restart(target);
                RemediationOutcome::Restarted
            }
            Err(e) => {
                error!(%target, error = %e, "restart failed");
                self.metrics.record_failure(target);
                RemediationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Tick, sleep `interval`, repeat until `shutdown` flips to true.
    ///
    /// Shutdown is only observed between ticks; a tick in progress always
    /// finishes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, dry_run = self.dry_run, "healer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let records = self.tick().await;
            debug!(remediations = records.len(), "tick complete");

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone; keep the cadence.
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }
        }

        info!("healer stopped");
    }
}
