//! HTTP-backed sources against a canned local responder.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use kubeward_core::{HealthSample, JobHealth, TargetFilter, classify};
use kubeward_probe::client::http_get;
use kubeward_probe::{PrometheusSource, SignalSource, SourceError};

/// Serve one canned response per connection, forever.
async fn canned(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let resp = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

const TARGETS: &str = include_str!("fixtures/targets.json");

#[tokio::test]
async fn prometheus_source_samples_jobs() {
    let addr = canned("200 OK", TARGETS).await;
    let source = PrometheusSource::new(&addr, "/api/v1/targets", Duration::from_secs(5)).unwrap();

    let sample = source.sample().await.unwrap();
    let HealthSample::Jobs(jobs) = &sample else {
        panic!("expected jobs sample");
    };
    assert_eq!(jobs.len(), 3);
    assert!(jobs.contains(&JobHealth::new("todo-app", "down")));

    let unhealthy = classify(&TargetFilter::default().apply(&sample));
    assert_eq!(unhealthy.iter().collect::<Vec<_>>(), vec!["todo-app"]);
}

#[tokio::test]
async fn prometheus_non_2xx_is_unavailable() {
    let addr = canned("503 Service Unavailable", "{}").await;
    let source = PrometheusSource::new(&addr, "/api/v1/targets", Duration::from_secs(5)).unwrap();

    let err = source.sample().await.unwrap_err();
    assert!(matches!(err, SourceError::HttpStatus { .. }));
}

#[tokio::test]
async fn prometheus_non_json_is_malformed() {
    let addr = canned("200 OK", "<html>not json</html>").await;
    let source = PrometheusSource::new(&addr, "/api/v1/targets", Duration::from_secs(5)).unwrap();

    let err = source.sample().await.unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)));
}

#[tokio::test]
async fn prometheus_unreachable_is_unavailable() {
    let source = PrometheusSource::new("127.0.0.1:1", "/api/v1/targets", Duration::from_millis(500)).unwrap();
    let err = source.sample().await.unwrap_err();
    assert!(matches!(err, SourceError::Http { .. } | SourceError::Timeout(_)));
}

#[tokio::test]
async fn http_get_returns_status_and_body() {
    let addr = canned("404 Not Found", "{\"missing\":true}").await;
    let resp = http_get(&addr, "/", Some("todo.local"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(resp.status, http::StatusCode::NOT_FOUND);
    assert_eq!(&resp.body[..], b"{\"missing\":true}");
}

#[tokio::test]
async fn http_get_times_out_on_silent_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    // Accept and hold the connection open without replying.
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let err = http_get(&addr, "/", None, Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Timeout(_)));
}
