//! Action dispatcher: rolling restarts of unhealthy workloads.
//!
//! A restart is a merge patch that stamps the pod template with a fresh
//! timestamp annotation. The controller then rolls the workload. Nothing is
//! deleted, so patching the same workload twice just triggers another rollout.

use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use kubeward_core::config::HealConfig;
use kubeward_probe::{Kubectl, SourceError};

use crate::error::RemediationError;

/// Boxed future returned by [`Remediator::restart`].
pub type RemediateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), RemediationError>> + Send + 'a>>;

/// Issues the corrective action for one unhealthy target.
pub trait Remediator: Send + Sync {
    /// Request a rolling restart of the workload backing `target`.
    fn restart<'a>(&'a self, target: &'a str) -> RemediateFuture<'a>;
}

/// Restarts workloads with `kubectl patch`.
pub struct KubectlRestarter {
    kubectl: Kubectl,
    namespace: String,
    workload_kind: String,
    annotation: String,
}

impl KubectlRestarter {
    pub fn new(kubectl: Kubectl, config: &HealConfig) -> Self {
        Self {
            kubectl,
            namespace: config.namespace.clone(),
            workload_kind: config.workload_kind.clone(),
            annotation: config.annotation.clone(),
        }
    }

    async fn patch(&self, target: &str) -> Result<(), RemediationError> {
        let body = restart_patch(&self.annotation, &restart_stamp());
        self.kubectl
            .run(&[
                "patch",
                &self.workload_kind,
                target,
                "--namespace",
                &self.namespace,
                "--type",
                "merge",
                "--patch",
                &body,
            ])
            .await
            .map_err(|e| classify_failure(target, e))?;

        info!(%target, namespace = %self.namespace, "rolling restart requested");
        Ok(())
    }
}

impl Remediator for KubectlRestarter {
    fn restart<'a>(&'a self, target: &'a str) -> RemediateFuture<'a> {
        Box::pin(self.patch(target))
    }
}

/// Merge-patch body that sets `annotation` on the pod template.
pub fn restart_patch(annotation: &str, stamp: &str) -> String {
    serde_json::json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": { annotation: stamp }
                }
            }
        }
    })
    .to_string()
}

/// Unix time with millisecond precision, e.g. "1718000000.123".
fn restart_stamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn classify_failure(target: &str, err: SourceError) -> RemediationError {
    match err {
        SourceError::CommandFailed { stderr, .. }
            if stderr.contains("NotFound") || stderr.contains("not found") =>
        {
            RemediationError::NotFound(target.to_string())
        }
        SourceError::CommandFailed { stderr, .. } => RemediationError::Rejected {
            target: target.to_string(),
            reason: stderr,
        },
        other => RemediationError::Unavailable {
            target: target.to_string(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn patch_body_shape() {
        let body = restart_patch("restarted-at", "1718000000.123");
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            v["spec"]["template"]["metadata"]["annotations"]["restarted-at"],
            "1718000000.123"
        );
    }

    #[cfg(unix)]
    #[test]
    fn not_found_stderr_maps_to_not_found() {
        use std::os::unix::process::ExitStatusExt;

        let err = SourceError::CommandFailed {
            program: "kubectl".to_string(),
            status: std::process::ExitStatus::from_raw(256),
            stderr: "Error from server (NotFound): deployments.apps \"ghost\" not found".to_string(),
        };
        assert!(matches!(
            classify_failure("ghost", err),
            RemediationError::NotFound(name) if name == "ghost"
        ));
    }

    #[test]
    fn stamp_is_numeric() {
        let stamp = restart_stamp();
        assert!(stamp.parse::<f64>().is_ok(), "{stamp}");
    }

    #[tokio::test]
    async fn missing_kubectl_is_unavailable() {
        let kubectl = Kubectl::new("/nonexistent/kubectl", None, Duration::from_secs(1));
        let restarter = KubectlRestarter::new(kubectl, &HealConfig::default());

        let err = restarter.restart("todo-app").await.unwrap_err();
        assert!(matches!(err, RemediationError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejected_patch() {
        let kubectl = Kubectl::new("false", None, Duration::from_secs(5));
        let restarter = KubectlRestarter::new(kubectl, &HealConfig::default());

        let err = restarter.restart("todo-app").await.unwrap_err();
        assert!(matches!(err, RemediationError::Rejected { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_patch() {
        // `true` accepts any arguments and exits 0.
        let kubectl = Kubectl::new("true", None, Duration::from_secs(5));
        let restarter = KubectlRestarter::new(kubectl, &HealConfig::default());
        assert!(restarter.restart("todo-app").await.is_ok());
    }
}
