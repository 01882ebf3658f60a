//! kubeward-heal: the poll scheduler in its two shapes.
//!
//! # Architecture
//!
//! ```text
//! ReadinessGate (bounded)                Healer (continuous)
//!   ├── SignalSource::sample()             ├── SignalSource::sample()
//!   ├── TargetFilter::apply + classify     ├── TargetFilter::apply + classify
//!   ├── Converged | sleep | TimedOut       ├── Remediator::restart() per target
//!   └── diagnostics on TimedOut            └── sleep(interval), repeat
//!
//! Recorder (shared) counts checks, restarts, failures
//! ```
//!
//! Both loops take the source and remediator as trait objects, so tests
//! drive them with in-memory fakes.

pub mod diagnostics;
pub mod error;
pub mod gate;
pub mod healer;
pub mod remediate;

pub use error::RemediationError;
pub use gate::{GatePolicy, ReadinessGate};
pub use healer::{Healer, RemediationOutcome, RemediationRecord};
pub use remediate::{KubectlRestarter, RemediateFuture, Remediator};
