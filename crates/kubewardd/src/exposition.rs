//! Pull endpoint for the counters.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Liveness |

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use kubeward_metrics::{Recorder, render_prometheus};

#[derive(Clone)]
pub struct ExpositionState {
    pub metrics: Arc<Recorder>,
}

pub fn router(metrics: Arc<Recorder>) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .route("/healthz", get(healthz))
        .with_state(ExpositionState { metrics })
}

/// GET /metrics
async fn prometheus_metrics(State(state): State<ExpositionState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render_prometheus(&state.metrics.snapshot()),
    )
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}

/// Serve the exposition router until `shutdown` flips to true.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<Recorder>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "metrics endpoint listening");

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;
    Ok(())
}
