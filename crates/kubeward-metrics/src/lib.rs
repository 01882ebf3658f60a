//! kubeward-metrics: process-wide counters for the health loop.
//!
//! # Architecture
//!
//! ```text
//! Recorder (Arc-shared by the loop and the /metrics handler)
//!   ├── record_check()            ← every sample attempt
//!   ├── record_restart(target)    ← successful remediation
//!   ├── record_failure(target)    ← failed remediation
//!   └── snapshot() → CounterSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus(&CounterSnapshot) → text/plain
//! ```
//!
//! Counters only ever increase. They live in memory and reset on restart.

pub mod prometheus;
pub mod recorder;

pub use prometheus::render_prometheus;
pub use recorder::{CounterSnapshot, Recorder};
