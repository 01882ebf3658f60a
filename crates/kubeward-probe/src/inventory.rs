//! Workload-inventory source: `kubectl get pods -A -o json`.
//!
//! The JSON listing is parsed eagerly into typed [`Target`]s here; nothing
//! untyped leaves this module.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use kubeward_core::{HealthSample, OwnerRef, Phase, Target};

use crate::error::SourceResult;
use crate::kubectl::Kubectl;
use crate::source::{SampleFuture, SignalSource};

/// Lists every pod in every namespace.
pub struct InventorySource {
    kubectl: Kubectl,
}

impl InventorySource {
    pub fn new(kubectl: Kubectl) -> Self {
        Self { kubectl }
    }

    async fn fetch(&self) -> SourceResult<HealthSample> {
        let list: PodList = self
            .kubectl
            .run_json(&["get", "pods", "--all-namespaces", "-o", "json"])
            .await?;
        let targets: Vec<Target> = list.items.into_iter().map(Target::from).collect();
        debug!(targets = targets.len(), "inventory sampled");
        Ok(HealthSample::Inventory(targets))
    }
}

impl SignalSource for InventorySource {
    fn name(&self) -> &str {
        "inventory"
    }

    fn sample(&self) -> SampleFuture<'_> {
        Box::pin(self.fetch())
    }
}

/// Parse a pod listing into targets.
pub fn parse_pod_list(json: &[u8]) -> SourceResult<Vec<Target>> {
    let list: PodList = serde_json::from_slice(json)?;
    Ok(list.items.into_iter().map(Target::from).collect())
}

// ── Wire format ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PodList {
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMetadata {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    owner_references: Vec<PodOwner>,
}

#[derive(Debug, Deserialize)]
struct PodOwner {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatus {
    #[serde(default)]
    phase: String,
    #[serde(default)]
    container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    conditions: Vec<PodCondition>,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct PodCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    status: String,
}

impl From<Pod> for Target {
    fn from(pod: Pod) -> Self {
        let Pod { metadata, status } = pod;
        Target {
            identifier: metadata.name,
            namespace: metadata.namespace,
            phase: Phase::parse(&status.phase),
            container_readiness: status.container_statuses.iter().map(|c| c.ready).collect(),
            conditions: status
                .conditions
                .into_iter()
                .map(|c| (c.kind, c.status == "True"))
                .collect(),
            owners: metadata
                .owner_references
                .into_iter()
                .map(|o| OwnerRef {
                    kind: o.kind,
                    name: o.name,
                })
                .collect(),
            labels: metadata.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use kubeward_core::{TargetFilter, classify};

    const PODS: &str = include_str!("../tests/fixtures/pods.json");

    #[test]
    fn parses_fixture() {
        let targets = parse_pod_list(PODS.as_bytes()).unwrap();
        assert_eq!(targets.len(), 6);

        let coredns = &targets[0];
        assert_eq!(coredns.namespace, "kube-system");
        assert_eq!(coredns.identifier, "coredns-6799fbcd5-x2x4k");
        assert_eq!(coredns.phase, Phase::Running);
        assert_eq!(coredns.container_readiness, vec![true]);
        assert_eq!(coredns.conditions.get("Ready"), Some(&true));
        assert_eq!(coredns.owners[0].kind, "ReplicaSet");
    }

    #[test]
    fn fixture_classification() {
        let targets = parse_pod_list(PODS.as_bytes()).unwrap();
        let sample = HealthSample::Inventory(targets);
        let unhealthy = classify(&TargetFilter::default().apply(&sample));

        assert_eq!(
            unhealthy.iter().collect::<Vec<_>>(),
            vec!["todo-app-5f7c9d8b6-qk2lm"]
        );
    }

    #[test]
    fn missing_status_fields_default() {
        let json = br#"{"items":[{"metadata":{"name":"p","namespace":"ns"}}]}"#;
        let targets = parse_pod_list(json).unwrap();
        assert_eq!(targets[0].phase, Phase::Unknown);
        assert!(targets[0].container_readiness.is_empty());
        assert!(!targets[0].is_healthy());
    }

    #[test]
    fn non_true_condition_status_is_false() {
        let json = br#"{"items":[{"metadata":{"name":"p","namespace":"ns"},
            "status":{"phase":"Running","conditions":[{"type":"Ready","status":"Unknown"}]}}]}"#;
        let targets = parse_pod_list(json).unwrap();
        assert_eq!(targets[0].conditions.get("Ready"), Some(&false));
    }

    #[test]
    fn missing_items_is_malformed() {
        let err = parse_pod_list(br#"{"kind":"PodList"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_pod_list(b"error: You must be logged in").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn pod_without_name_is_malformed() {
        let err = parse_pod_list(br#"{"items":[{"metadata":{"namespace":"ns"}}]}"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
