//! Ingress-endpoint source.
//!
//! Lists every ingress host with kubectl, then GETs each one through the
//! ingress controller with the host in the `Host` header. Redirects that
//! stay on the same host are followed, up to [`MAX_REDIRECTS`]. A host is
//! "up" only when the final status is 200; any other status, a timeout or
//! a connection error makes it "down". Failing to list ingresses fails the
//! whole sample.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use kubeward_core::{HealthSample, JobHealth};

use crate::client::http_get;
use crate::error::{SetupError, SourceResult};
use crate::kubectl::Kubectl;
use crate::source::{SampleFuture, SignalSource, check_address};

/// Redirect hops followed per host before giving up.
pub const MAX_REDIRECTS: usize = 5;

pub struct IngressSource {
    kubectl: Kubectl,
    address: String,
    path: String,
    timeout: Duration,
}

impl IngressSource {
    pub fn new(
        kubectl: Kubectl,
        address: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<Self, SetupError> {
        check_address(address)?;
        Ok(Self {
            kubectl,
            address: address.to_string(),
            path: path.to_string(),
            timeout,
        })
    }

    /// Probe one host. The timeout bounds the whole redirect chain.
    async fn probe(&self, host: &str) -> JobHealth {
        let health = match tokio::time::timeout(self.timeout, self.final_status(host)).await {
            Ok(Ok(status)) if status == http::StatusCode::OK => "up",
            Ok(Ok(status)) => {
                debug!(%host, %status, "ingress host not ok");
                "down"
            }
            Ok(Err(e)) => {
                debug!(%host, error = %e, "ingress host unreachable");
                "down"
            }
            Err(_) => {
                debug!(%host, timeout = ?self.timeout, "ingress host timed out");
                "down"
            }
        };
        JobHealth::new(host, health)
    }

    /// Status at the end of the same-host redirect chain.
    async fn final_status(&self, host: &str) -> SourceResult<http::StatusCode> {
        let mut path = self.path.clone();
        let mut hops = 0;
        loop {
            let resp = http_get(&self.address, &path, Some(host), self.timeout).await?;
            let next = redirect_path(resp.status, resp.location.as_deref(), host);
            match next {
                Some(next) if hops < MAX_REDIRECTS => {
                    debug!(%host, from = %path, to = %next, "following redirect");
                    path = next;
                    hops += 1;
                }
                _ => return Ok(resp.status),
            }
        }
    }

    async fn fetch(&self) -> SourceResult<HealthSample> {
        let stdout = self
            .kubectl
            .run(&["get", "ingress", "--all-namespaces", "-o", "json"])
            .await?;
        let hosts = parse_ingress_hosts(&stdout)?;

        let mut jobs = Vec::with_capacity(hosts.len());
        for host in &hosts {
            jobs.push(self.probe(host).await);
        }
        Ok(HealthSample::Jobs(jobs))
    }
}

impl SignalSource for IngressSource {
    fn name(&self) -> &str {
        "ingress"
    }

    fn sample(&self) -> SampleFuture<'_> {
        Box::pin(self.fetch())
    }
}

/// Distinct rule hosts across all ingresses, sorted.
pub fn parse_ingress_hosts(json: &[u8]) -> SourceResult<Vec<String>> {
    let list: IngressList = serde_json::from_slice(json)?;
    let hosts: BTreeSet<String> = list
        .items
        .into_iter()
        .flat_map(|i| i.spec.rules)
        .filter_map(|r| r.host)
        .filter(|h| !h.is_empty())
        .collect();
    Ok(hosts.into_iter().collect())
}

/// Path to request next if `status` redirects within `host`.
///
/// Accepts absolute paths and `http://` URLs whose authority is `host`
/// (with or without a port). Anything else ends the chain.
pub fn redirect_path(
    status: http::StatusCode,
    location: Option<&str>,
    host: &str,
) -> Option<String> {
    if !status.is_redirection() {
        return None;
    }
    let location = location?;
    if location.starts_with('/') {
        return Some(location.to_string());
    }

    let rest = location.strip_prefix("http://")?;
    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, "/"),
    };
    let authority_host = authority.rsplit_once(':').map_or(authority, |(h, _)| h);
    authority_host
        .eq_ignore_ascii_case(host)
        .then(|| path.to_string())
}

// ── Wire format ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IngressList {
    items: Vec<Ingress>,
}

#[derive(Debug, Deserialize)]
struct Ingress {
    #[serde(default)]
    spec: IngressSpec,
}

#[derive(Debug, Default, Deserialize)]
struct IngressSpec {
    #[serde(default)]
    rules: Vec<IngressRule>,
}

#[derive(Debug, Deserialize)]
struct IngressRule {
    host: Option<String>,
}
