//! kubewardd: wiring for the two loop entry points.
//!
//! - `gate`: bounded readiness gate. Exit code 0 on convergence, 1 on
//!   timeout or setup failure.
//! - `heal`: continuous self-healing loop plus a `/metrics` endpoint.
//!
//! Each invocation runs exactly one mode.

pub mod exposition;
pub mod modes;
