//! Minimal HTTP/1.1 GET over a fresh TCP connection.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use tracing::debug;

use crate::error::{SourceError, SourceResult};

/// Status and full body of a GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: http::StatusCode,
    /// `Location` header, if present and valid UTF-8.
    pub location: Option<String>,
    pub body: Bytes,
}

/// GET `http://{address}{path}`, with `host` overriding the Host header.
///
/// The whole exchange (connect, request, body) is bounded by `timeout`.
/// Any status is returned as `Ok`; callers decide what counts as success.
pub async fn http_get(
    address: &str,
    path: &str,
    host: Option<&str>,
    timeout: Duration,
) -> SourceResult<HttpResponse> {
    let uri = format!("http://{address}{path}");

    tokio::time::timeout(timeout, get(address, &uri, host.unwrap_or(address)))
        .await
        .map_err(|_| {
            debug!(%uri, "http request timed out");
            SourceError::Timeout(timeout)
        })?
}

async fn get(address: &str, uri: &str, host: &str) -> SourceResult<HttpResponse> {
    let fail = |reason: String| {
        debug!(%uri, %reason, "http request failed");
        SourceError::Http {
            uri: uri.to_string(),
            reason,
        }
    };

    let stream = tokio::net::TcpStream::connect(address)
        .await
        .map_err(|e| fail(e.to_string()))?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| fail(e.to_string()))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(uri)
        .header("host", host)
        .header("accept", "application/json")
        .header("user-agent", "kubeward/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| fail(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| fail(e.to_string()))?;
    let status = resp.status();
    let location = resp
        .headers()
        .get(http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| fail(e.to_string()))?
        .to_bytes();

    Ok(HttpResponse {
        status,
        location,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_port_is_http_error() {
        let err = http_get("127.0.0.1:1", "/", None, Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Http { .. } | SourceError::Timeout(_)));
    }
}
