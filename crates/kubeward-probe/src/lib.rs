//! kubeward-probe: signal sources for the health loop.
//!
//! # Architecture
//!
//! ```text
//! SignalSource (trait, one sample() per tick, no internal retry)
//!   ├── InventorySource  → kubectl get pods -A -o json  → HealthSample::Inventory
//!   ├── PrometheusSource → GET /api/v1/targets          → HealthSample::Jobs
//!   └── IngressSource    → kubectl get ingress + GET    → HealthSample::Jobs
//! ```
//!
//! Payloads are parsed into typed samples at this boundary. A failed call
//! surfaces as [`SourceError`]; a client that cannot be built at startup
//! surfaces as [`SetupError`].

pub mod client;
pub mod error;
pub mod ingress;
pub mod inventory;
pub mod kubectl;
pub mod prometheus;
pub mod source;

pub use error::{SetupError, SourceError, SourceResult};
pub use ingress::IngressSource;
pub use inventory::InventorySource;
pub use kubectl::Kubectl;
pub use prometheus::PrometheusSource;
pub use source::{SampleFuture, SignalSource};
