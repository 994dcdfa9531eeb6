//! HTTP facade and lifecycle services for an infrastructure-driver
//! deployment built on `strata-core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware_layer;
pub mod routes;
pub mod services;
pub mod state;

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Assembles the full router: façade routes under `/v1`, wrapped in the
/// trace-context and logging middleware, plus the ambient tower-http
/// layers (request id, tracing span, compression, permissive CORS).
pub fn build_router(state: AppState) -> Router {
    let api_routes = routes::api::router().layer(middleware::from_fn(
        middleware_layer::trace_context::trace_context_middleware,
    ));

    Router::new()
        .nest("/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(middleware_layer::logging::logging_middleware)),
        )
        .with_state(state)
}
