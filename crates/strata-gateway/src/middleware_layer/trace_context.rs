//! Populates the per-request trace context from inbound `X-Tracectx-*`
//! headers before the rest of the middleware stack and the handler run.

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use strata_core::trace_context;

pub async fn trace_context_middleware(request: Request<Body>, next: Next) -> Response {
    let headers: Vec<(String, String)> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();

    trace_context::scope(async move {
        let header_refs: Vec<(&str, &str)> = headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        trace_context::set_from_headers(header_refs);
        next.run(request).await
    })
    .await
}
