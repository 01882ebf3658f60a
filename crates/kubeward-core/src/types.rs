//! Domain types for one poll tick.
//!
//! A `HealthSample` is produced fresh by a signal source on every tick,
//! filtered, classified into an `UnhealthySet`, and then dropped. None of
//! these types carry state from one tick into the next.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Targets ───────────────────────────────────────────────────────

/// Lifecycle phase of a workload instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Phase {
    /// Parse a phase string as reported by the control plane.
    ///
    /// Anything unrecognised (including the empty string) maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => Phase::Pending,
            "Running" => Phase::Running,
            "Succeeded" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference from a target to the object that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

/// Snapshot of one monitored workload instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique within `namespace`.
    pub identifier: String,
    pub namespace: String,
    pub phase: Phase,
    /// One entry per container, in declaration order.
    pub container_readiness: Vec<bool>,
    /// Condition type → status (`true` only when the status is exactly "True").
    pub conditions: BTreeMap<String, bool>,
    pub owners: Vec<OwnerRef>,
    pub labels: BTreeMap<String, String>,
}

impl Target {
    /// Create a target in `phase` with no containers, conditions, owners or labels.
    pub fn new(namespace: &str, identifier: &str, phase: Phase) -> Self {
        Self {
            identifier: identifier.to_string(),
            namespace: namespace.to_string(),
            phase,
            container_readiness: Vec::new(),
            conditions: BTreeMap::new(),
            owners: Vec::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Whether every readiness signal agrees the target is healthy.
    ///
    /// Unhealthy iff the phase is not `Running`, any container is not ready,
    /// or a `Ready` condition is false.
    pub fn is_healthy(&self) -> bool {
        self.phase == Phase::Running
            && self.container_readiness.iter().all(|ready| *ready)
            && self.conditions.get("Ready").copied().unwrap_or(true)
    }

    /// Readiness flags rendered as `ready/total`.
    pub fn ready_summary(&self) -> String {
        let ready = self.container_readiness.iter().filter(|r| **r).count();
        format!("{ready}/{}", self.container_readiness.len())
    }
}

/// Health of one scrape job (or probed endpoint) as `(job, health)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHealth {
    pub job: String,
    pub health: String,
}

impl JobHealth {
    pub fn new(job: &str, health: &str) -> Self {
        Self {
            job: job.to_string(),
            health: health.to_string(),
        }
    }

    /// Only the exact string "up" counts as healthy.
    pub fn is_up(&self) -> bool {
        self.health == "up"
    }
}

// ── Samples ───────────────────────────────────────────────────────

/// Raw result of one signal-source query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum HealthSample {
    /// Workload-inventory listing.
    Inventory(Vec<Target>),
    /// Metrics-endpoint (or endpoint-probe) listing.
    Jobs(Vec<JobHealth>),
}

impl HealthSample {
    /// Number of entries in the sample.
    pub fn len(&self) -> usize {
        match self {
            HealthSample::Inventory(targets) => targets.len(),
            HealthSample::Jobs(jobs) => jobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Classification results ────────────────────────────────────────

/// Identifiers of targets that failed the readiness test on one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhealthySet(BTreeSet<String>);

impl UnhealthySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        self.0.insert(identifier.into())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.0.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for UnhealthySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for UnhealthySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Terminal value of a bounded readiness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// An empty unhealthy set was observed.
    Converged { attempts: u32 },
    /// Max attempts exhausted. `last_sample` is `None` if every attempt
    /// failed to produce a sample.
    TimedOut {
        attempts: u32,
        unhealthy: UnhealthySet,
        last_sample: Option<HealthSample>,
    },
}

impl PollOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }

    /// Process exit code for the calling pipeline: 0 on convergence, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            PollOutcome::Converged { .. } => 0,
            PollOutcome::TimedOut { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_pod() -> Target {
        let mut t = Target::new("default", "api-0", Phase::Running);
        t.container_readiness = vec![true, true];
        t.conditions.insert("Ready".to_string(), true);
        t
    }

    #[test]
    fn running_ready_pod_is_healthy() {
        assert!(ready_pod().is_healthy());
    }

    #[test]
    fn new_target_keeps_given_phase() {
        let t = Target::new("jobs", "migrate-1", Phase::Pending);
        assert_eq!(t.phase, Phase::Pending);
        assert_eq!(t.namespace, "jobs");
        assert!(t.container_readiness.is_empty() && t.owners.is_empty());
    }

    #[test]
    fn non_running_phase_is_unhealthy() {
        for phase in [Phase::Pending, Phase::Succeeded, Phase::Failed, Phase::Unknown] {
            let mut t = ready_pod();
            t.phase = phase;
            assert!(!t.is_healthy(), "{phase} should be unhealthy");
        }
    }

    #[test]
    fn one_unready_container_is_unhealthy() {
        let mut t = ready_pod();
        t.container_readiness = vec![true, false];
        assert!(!t.is_healthy());
    }

    #[test]
    fn ready_condition_false_is_unhealthy() {
        let mut t = ready_pod();
        t.conditions.insert("Ready".to_string(), false);
        assert!(!t.is_healthy());
    }

    #[test]
    fn other_false_conditions_do_not_matter() {
        let mut t = ready_pod();
        t.conditions.insert("PodScheduled".to_string(), false);
        t.labels.insert("app".to_string(), "api".to_string());
        assert!(t.is_healthy());
    }

    #[test]
    fn missing_ready_condition_is_not_a_failure() {
        let mut t = ready_pod();
        t.conditions.clear();
        assert!(t.is_healthy());
    }

    #[test]
    fn phase_parse_falls_back_to_unknown() {
        assert_eq!(Phase::parse("Running"), Phase::Running);
        assert_eq!(Phase::parse(""), Phase::Unknown);
        assert_eq!(Phase::parse("Evicted"), Phase::Unknown);
    }

    #[test]
    fn job_health_only_exact_up() {
        assert!(JobHealth::new("api", "up").is_up());
        assert!(!JobHealth::new("api", "UP").is_up());
        assert!(!JobHealth::new("api", "down").is_up());
        assert!(!JobHealth::new("api", "unknown").is_up());
    }

    #[test]
    fn ready_summary_counts() {
        let mut t = ready_pod();
        t.container_readiness = vec![true, false, true];
        assert_eq!(t.ready_summary(), "2/3");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(PollOutcome::Converged { attempts: 1 }.exit_code(), 0);
        let timed_out = PollOutcome::TimedOut {
            attempts: 3,
            unhealthy: UnhealthySet::new(),
            last_sample: None,
        };
        assert_eq!(timed_out.exit_code(), 1);
        assert!(!timed_out.is_converged());
    }
}
