//! kubeward-core: the pure part of the health loop.
//!
//! Holds the per-tick data model, the exclusion filter, and the unhealthy
//! classifier shared by the bounded readiness gate and the continuous
//! healer, plus the `kubeward.toml` config types.
//!
//! ```text
//! HealthSample ──TargetFilter::apply──▶ HealthSample ──classify──▶ UnhealthySet
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod types;

pub use config::{KubewardConfig, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use filter::{TargetFilter, classify};
pub use types::*;
