//! Metrics-endpoint source: Prometheus `/api/v1/targets`.
//!
//! Each active target becomes a `(job, health)` pair. Anything other than
//! exactly "up" is classified unhealthy downstream.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use kubeward_core::{HealthSample, JobHealth};

use crate::error::{SetupError, SourceError, SourceResult};
use crate::client::http_get;
use crate::source::{SampleFuture, SignalSource, check_address};

pub struct PrometheusSource {
    address: String,
    path: String,
    timeout: Duration,
}

impl PrometheusSource {
    pub fn new(address: &str, path: &str, timeout: Duration) -> Result<Self, SetupError> {
        check_address(address)?;
        Ok(Self {
            address: address.to_string(),
            path: path.to_string(),
            timeout,
        })
    }

    async fn fetch(&self) -> SourceResult<HealthSample> {
        let resp = http_get(&self.address, &self.path, None, self.timeout).await?;
        if !resp.status.is_success() {
            return Err(SourceError::HttpStatus {
                uri: format!("http://{}{}", self.address, self.path),
                status: resp.status,
            });
        }
        let jobs = parse_targets(&resp.body)?;
        debug!(targets = jobs.len(), "prometheus targets sampled");
        Ok(HealthSample::Jobs(jobs))
    }
}

impl SignalSource for PrometheusSource {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn sample(&self) -> SampleFuture<'_> {
        Box::pin(self.fetch())
    }
}

/// Parse a `/api/v1/targets` body into `(job, health)` pairs.
pub fn parse_targets(json: &[u8]) -> SourceResult<Vec<JobHealth>> {
    let resp: TargetsResponse = serde_json::from_slice(json)?;
    if resp.status != "success" {
        return Err(SourceError::QueryStatus(resp.status));
    }
    let data = resp
        .data
        .ok_or_else(|| SourceError::Malformed("missing data".to_string()))?;

    data.active_targets
        .into_iter()
        .map(|t| {
            let job = t
                .labels
                .get("job")
                .ok_or_else(|| SourceError::Malformed("active target without job label".to_string()))?;
            Ok(JobHealth::new(job, &t.health))
        })
        .collect()
}

// ── Wire format ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TargetsResponse {
    status: String,
    data: Option<TargetsData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetsData {
    #[serde(default)]
    active_targets: Vec<ActiveTarget>,
}

#[derive(Debug, Deserialize)]
struct ActiveTarget {
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    health: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGETS: &str = include_str!("../tests/fixtures/targets.json");

    #[test]
    fn parses_fixture() {
        let jobs = parse_targets(TARGETS.as_bytes()).unwrap();
        assert_eq!(
            jobs,
            vec![
                JobHealth::new("flask-metrics-app", "up"),
                JobHealth::new("todo-app", "down"),
                JobHealth::new("remediator", "unknown"),
            ]
        );
    }

    #[test]
    fn error_status_is_rejected() {
        let err = parse_targets(br#"{"status":"error","errorType":"bad_data"}"#).unwrap_err();
        assert!(matches!(err, SourceError::QueryStatus(s) if s == "error"));
    }

    #[test]
    fn missing_data_is_malformed() {
        let err = parse_targets(br#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn missing_job_label_is_malformed() {
        let body = br#"{"status":"success","data":{"activeTargets":[{"labels":{},"health":"up"}]}}"#;
        assert!(matches!(parse_targets(body), Err(SourceError::Malformed(_))));
    }

    #[test]
    fn empty_target_list() {
        let body = br#"{"status":"success","data":{"activeTargets":[],"droppedTargets":[]}}"#;
        assert!(parse_targets(body).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_address() {
        assert!(PrometheusSource::new("localhost", "/api/v1/targets", Duration::from_secs(1)).is_err());
    }
}
