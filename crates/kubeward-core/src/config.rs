//! kubeward.toml configuration parser.
//!
//! Every section and field is optional; anything missing falls back to the
//! defaults below. Durations are strings like "15s", "500ms" or "1m".

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubewardConfig {
    pub gate: GateConfig,
    pub heal: HealConfig,
    pub exclusions: ExclusionConfig,
    pub kubectl: KubectlConfig,
    pub prometheus: PrometheusConfig,
    pub ingress: IngressConfig,
    pub exposition: ExpositionConfig,
}

/// Bounded readiness gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub max_attempts: u32,
    pub delay: String,
    /// Minimum filtered targets required before the gate may converge.
    pub min_targets: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay: "15s".to_string(),
            min_targets: 0,
        }
    }
}

/// Continuous healer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    pub interval: String,
    /// Namespace holding the workloads that get restarted.
    pub namespace: String,
    /// Kind of workload patched on remediation.
    pub workload_kind: String,
    /// Annotation key carrying the restart timestamp.
    pub annotation: String,
    /// The healer's own scrape job; seeded in the counters.
    pub self_job: String,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            interval: "60s".to_string(),
            namespace: "default".to_string(),
            workload_kind: "deployment".to_string(),
            annotation: "restarted-at".to_string(),
            self_job: "remediator".to_string(),
        }
    }
}

/// Rules for targets that never count against readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Name prefixes of load-balancer shim targets.
    pub shim_prefixes: Vec<String>,
    /// Labels (key → value) marking load-balancer shim targets.
    pub shim_labels: BTreeMap<String, String>,
    /// Owner kinds whose targets are batch work.
    pub owner_kinds: Vec<String>,
    /// Owner name prefixes of install hooks.
    pub owner_prefixes: Vec<String>,
    /// Scrape jobs dropped from metrics samples.
    pub excluded_jobs: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            shim_prefixes: vec!["svclb-".to_string()],
            shim_labels: BTreeMap::from([("app".to_string(), "svclb".to_string())]),
            owner_kinds: vec!["Job".to_string()],
            owner_prefixes: vec!["helm-install-".to_string()],
            excluded_jobs: vec!["remediator".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    pub binary: String,
    /// Optional `--context` passed to every invocation.
    pub context: Option<String>,
    pub timeout: String,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl".to_string(),
            context: None,
            timeout: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// host:port of the Prometheus server.
    pub address: String,
    pub targets_path: String,
    pub timeout: String,
    pub max_attempts: u32,
    pub delay: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9090".to_string(),
            targets_path: "/api/v1/targets".to_string(),
            timeout: "5s".to_string(),
            max_attempts: 10,
            delay: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// host:port of the ingress controller; hosts are sent in the Host header.
    pub address: String,
    pub path: String,
    pub timeout: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:80".to_string(),
            path: "/".to_string(),
            timeout: "5s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpositionConfig {
    pub bind: String,
}

impl Default for ExpositionConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8001".to_string(),
        }
    }
}

impl KubewardConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: KubewardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => {
                debug!(path = %p.display(), "loading config");
                Self::from_file(p)
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject durations that do not parse, so the loops never see them.
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("gate.delay", &self.gate.delay),
            ("heal.interval", &self.heal.interval),
            ("kubectl.timeout", &self.kubectl.timeout),
            ("prometheus.timeout", &self.prometheus.timeout),
            ("prometheus.delay", &self.prometheus.delay),
            ("ingress.timeout", &self.ingress.timeout),
        ] {
            duration_field(field, value)?;
        }
        Ok(())
    }
}

/// Parse a named duration field, reporting the field on failure.
pub fn duration_field(field: &str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "1m". Plain numbers are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
