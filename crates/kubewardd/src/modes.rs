//! Assembly of the bounded gate and the continuous healer from config.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use kubeward_core::config::duration_field;
use kubeward_core::{KubewardConfig, PollOutcome, TargetFilter};
use kubeward_heal::diagnostics::render_timeout;
use kubeward_heal::{GatePolicy, Healer, KubectlRestarter, ReadinessGate};
use kubeward_metrics::Recorder;
use kubeward_probe::{IngressSource, InventorySource, Kubectl, PrometheusSource, SetupError, SignalSource};

use crate::exposition;

/// Which signal source the gate polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// All pods in all namespaces.
    Inventory,
    /// Prometheus active scrape targets.
    Prometheus,
    /// HTTP reachability of every ingress host.
    Ingress,
}

/// CLI values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct GateOverrides {
    pub max_attempts: Option<u32>,
    pub delay: Option<String>,
    pub min_targets: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct HealOptions {
    pub interval: Option<String>,
    pub bind: Option<SocketAddr>,
    pub dry_run: bool,
}

/// Resolve the attempt budget for `kind`.
///
/// The Prometheus gate has its own cadence and never converges on an empty
/// target list.
pub fn gate_policy(
    kind: SourceKind,
    config: &KubewardConfig,
    overrides: &GateOverrides,
) -> anyhow::Result<GatePolicy> {
    let (max_attempts, delay, min_targets) = match kind {
        SourceKind::Prometheus => (
            config.prometheus.max_attempts,
            config.prometheus.delay.as_str(),
            config.gate.min_targets.max(1),
        ),
        SourceKind::Inventory | SourceKind::Ingress => (
            config.gate.max_attempts,
            config.gate.delay.as_str(),
            config.gate.min_targets,
        ),
    };

    let delay = overrides.delay.as_deref().unwrap_or(delay);
    Ok(GatePolicy {
        max_attempts: overrides.max_attempts.unwrap_or(max_attempts),
        delay: duration_field("delay", delay)?,
        min_targets: overrides.min_targets.unwrap_or(min_targets),
    })
}

/// Build the signal source; kubectl-backed sources verify kubectl first.
pub async fn build_source(
    kind: SourceKind,
    config: &KubewardConfig,
) -> Result<Arc<dyn SignalSource>, SetupError> {
    let source: Arc<dyn SignalSource> = match kind {
        SourceKind::Inventory => {
            let kubectl = Kubectl::connect(&config.kubectl).await?;
            Arc::new(InventorySource::new(kubectl))
        }
        SourceKind::Prometheus => Arc::new(prometheus_source(config)?),
        SourceKind::Ingress => {
            let kubectl = Kubectl::connect(&config.kubectl).await?;
            let timeout = duration_field("ingress.timeout", &config.ingress.timeout)?;
            Arc::new(IngressSource::new(
                kubectl,
                &config.ingress.address,
                &config.ingress.path,
                timeout,
            )?)
        }
    };
    Ok(source)
}

fn prometheus_source(config: &KubewardConfig) -> Result<PrometheusSource, SetupError> {
    let timeout = duration_field("prometheus.timeout", &config.prometheus.timeout)?;
    PrometheusSource::new(
        &config.prometheus.address,
        &config.prometheus.targets_path,
        timeout,
    )
}

/// Run the bounded gate and print diagnostics on timeout.
pub async fn run_gate(
    kind: SourceKind,
    config: &KubewardConfig,
    overrides: &GateOverrides,
) -> anyhow::Result<PollOutcome> {
    let policy = gate_policy(kind, config, overrides)?;
    let source = build_source(kind, config)
        .await
        .context("failed to initialize signal source")?;
    let filter = TargetFilter::new(config.exclusions.clone());
    let metrics = Arc::new(Recorder::new(&config.heal.self_job));

    info!(
        source = source.name(),
        max_attempts = policy.max_attempts,
        delay = ?policy.delay,
        min_targets = policy.min_targets,
        "readiness gate starting"
    );

    let gate = ReadinessGate::new(source, filter, policy, metrics);
    let outcome = gate.run().await;

    match render_timeout(&outcome, gate.filter()) {
        Some(dump) => print!("{dump}"),
        None => info!("readiness gate passed"),
    }
    Ok(outcome)
}

/// Run the healer and the metrics endpoint until Ctrl-C.
pub async fn run_heal(config: &KubewardConfig, options: &HealOptions) -> anyhow::Result<()> {
    let interval = options.interval.as_deref().unwrap_or(&config.heal.interval);
    let interval = duration_field("interval", interval)?;
    let bind: SocketAddr = match options.bind {
        Some(addr) => addr,
        None => config
            .exposition
            .bind
            .parse()
            .with_context(|| format!("invalid exposition.bind {:?}", config.exposition.bind))?,
    };

    // Setup failures are fatal before any polling starts.
    let kubectl = Kubectl::connect(&config.kubectl)
        .await
        .context("failed to initialize kubernetes client")?;
    let source = prometheus_source(config).context("failed to initialize metrics source")?;
    let remediator = KubectlRestarter::new(kubectl, &config.heal);
    let metrics = Arc::new(Recorder::new(&config.heal.self_job));

    let healer = Healer::new(
        Arc::new(source),
        TargetFilter::new(config.exclusions.clone()),
        Arc::new(remediator),
        Arc::clone(&metrics),
        interval,
    )
    .with_dry_run(options.dry_run);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind metrics endpoint on {bind}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let exposition_handle = tokio::spawn(exposition::serve(
        listener,
        Arc::clone(&metrics),
        shutdown_rx.clone(),
    ));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
        let _ = shutdown_tx.send(true);
    });

    healer.run(shutdown_rx).await;

    exposition_handle
        .await
        .context("metrics endpoint task panicked")??;
    Ok(())
}
