//! Request logging middleware: wraps every request in a tracing span
//! carrying method/path/status/duration, in the teacher's span-then-log
//! shape.

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{error, info, warn};

pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| uri.path())
        .to_string();

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    );
    let _guard = span.enter();

    info!(method = %method, uri = %uri, "request started");

    let response = next.run(request).await;

    let duration = start_time.elapsed();
    let status = response.status();

    span.record("status", status.as_u16());
    span.record("duration_ms", duration.as_millis() as u64);

    match status {
        status if status.is_server_error() => {
            error!(method = %method, path = %path, status = %status, duration_ms = duration.as_millis(), "request completed with server error");
        }
        status if status.is_client_error() => {
            warn!(method = %method, path = %path, status = %status, duration_ms = duration.as_millis(), "request completed with client error");
        }
        _ => {
            info!(method = %method, path = %path, status = %status, duration_ms = duration.as_millis(), "request completed");
        }
    }

    response
}
