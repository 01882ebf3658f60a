//! Counter registry.
//!
//! The unlabeled check counter is a bare atomic. Labeled counters sit in a
//! mutex-guarded map of atomics so the polling loop and the exposition
//! handler can touch them from different tasks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

type LabeledCounters = Mutex<BTreeMap<String, Arc<AtomicU64>>>;

/// Monotonic counters for checks and remediations.
#[derive(Debug, Default)]
pub struct Recorder {
    checks: AtomicU64,
    restarts: LabeledCounters,
    failures: LabeledCounters,
}

/// Point-in-time copy of every counter, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub checks: u64,
    /// target → successful restarts.
    pub restarts: BTreeMap<String, u64>,
    /// target → failed restarts.
    pub failures: BTreeMap<String, u64>,
}

impl Recorder {
    /// Create a recorder with every family seeded at zero.
    ///
    /// `seed_label` pre-registers the labeled counters so a scrape before
    /// the first remediation still reports a value.
    pub fn new(seed_label: &str) -> Self {
        let recorder = Self::default();
        counter(&recorder.restarts, seed_label);
        counter(&recorder.failures, seed_label);
        debug!(seed_label, "metrics recorder initialized");
        recorder
    }

    /// A sample was attempted (whether or not it succeeded).
    pub fn record_check(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    /// A restart was issued successfully for `target`.
    pub fn record_restart(&self, target: &str) {
        counter(&self.restarts, target).fetch_add(1, Ordering::Relaxed);
    }

    /// A restart for `target` was rejected or could not be issued.
    pub fn record_failure(&self, target: &str) {
        counter(&self.failures, target).fetch_add(1, Ordering::Relaxed);
    }

    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    pub fn restarts(&self, target: &str) -> u64 {
        read(&self.restarts, target)
    }

    pub fn failures(&self, target: &str) -> u64 {
        read(&self.failures, target)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            checks: self.checks(),
            restarts: copy(&self.restarts),
            failures: copy(&self.failures),
        }
    }
}

/// Get or create the counter for `label`.
fn counter(map: &LabeledCounters, label: &str) -> Arc<AtomicU64> {
    let mut guard = map.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .entry(label.to_string())
        .or_insert_with(|| Arc::new(AtomicU64::new(0)))
        .clone()
}

fn read(map: &LabeledCounters, label: &str) -> u64 {
    let guard = map.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .get(label)
        .map(|c| c.load(Ordering::Relaxed))
        .unwrap_or(0)
}

fn copy(map: &LabeledCounters) -> BTreeMap<String, u64> {
    let guard = map.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .iter()
        .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
        .collect()
}
