//! Request logging middleware.
//!
//! One line per request with method, path, status, latency and, for price
//! responses, how the cache served them. Upstream failures surface as 502,
//! so those lines go out at WARN.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

use crate::cache::CacheStatus;

/// Logging middleware without client address (for use without ConnectInfo).
pub async fn request_logging_simple(request: Request<Body>, next: Next) -> Response {
    // Health probes hit every few seconds.
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    let cache = response
        .extensions()
        .get::<CacheStatus>()
        .map(|cache| cache.as_str());

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "Price request failed upstream"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            cache,
            "Request completed"
        );
    }

    response
}
