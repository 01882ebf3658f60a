//! Exclusion filter and unhealthy classifier.
//!
//! Both bounded and continuous loops, and the final diagnostic dump, go
//! through the same `TargetFilter` so that the exclusion rules cannot drift
//! between them. Filtering always happens before classification.

use crate::config::ExclusionConfig;
use crate::types::{HealthSample, JobHealth, Phase, Target, UnhealthySet};

/// Predicate deciding which targets never count against readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFilter {
    rules: ExclusionConfig,
}

impl TargetFilter {
    pub fn new(rules: ExclusionConfig) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ExclusionConfig {
        &self.rules
    }

    /// Whether a workload target is excluded.
    ///
    /// True if any of: the name has a shim prefix, the phase is `Succeeded`,
    /// a shim label matches, or an owner is a batch job / install hook.
    pub fn is_excluded(&self, target: &Target) -> bool {
        let r = &self.rules;

        let shim_name = r
            .shim_prefixes
            .iter()
            .any(|p| target.identifier.starts_with(p.as_str()));
        let finished = target.phase == Phase::Succeeded;
        let shim_label = r
            .shim_labels
            .iter()
            .any(|(k, v)| target.labels.get(k) == Some(v));
        let batch_owner = target.owners.iter().any(|o| {
            r.owner_kinds.iter().any(|k| *k == o.kind)
                || r.owner_prefixes.iter().any(|p| o.name.starts_with(p.as_str()))
        });

        shim_name || finished || shim_label || batch_owner
    }

    /// Whether a scrape job is excluded (e.g. the healer's own job).
    pub fn is_job_excluded(&self, job: &JobHealth) -> bool {
        self.rules.excluded_jobs.iter().any(|j| *j == job.job)
    }

    /// Order-preserving subsequence of `sample` without excluded entries.
    pub fn apply(&self, sample: &HealthSample) -> HealthSample {
        match sample {
            HealthSample::Inventory(targets) => HealthSample::Inventory(
                targets
                    .iter()
                    .filter(|t| !self.is_excluded(t))
                    .cloned()
                    .collect(),
            ),
            HealthSample::Jobs(jobs) => HealthSample::Jobs(
                jobs.iter()
                    .filter(|j| !self.is_job_excluded(j))
                    .cloned()
                    .collect(),
            ),
        }
    }
}

impl Default for TargetFilter {
    fn default() -> Self {
        Self::new(ExclusionConfig::default())
    }
}

/// Reduce an already-filtered sample to the identifiers that fail the
/// readiness test. Pure: same input, same output.
pub fn classify(sample: &HealthSample) -> UnhealthySet {
    match sample {
        HealthSample::Inventory(targets) => targets
            .iter()
            .filter(|t| !t.is_healthy())
            .map(|t| t.identifier.as_str())
            .collect(),
        HealthSample::Jobs(jobs) => jobs
            .iter()
            .filter(|j| !j.is_up())
            .map(|j| j.job.as_str())
            .collect(),
    }
}
