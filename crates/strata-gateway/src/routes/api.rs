//! The four façade operations, routed under `/v1/infrastructure`.

use axum::routing::post;
use axum::Router;

use crate::{handlers, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/infrastructure", post(handlers::facade::create))
        .route("/infrastructure/delete", post(handlers::facade::delete))
        .route("/infrastructure/query", post(handlers::facade::query))
        .route("/infrastructure/find", post(handlers::facade::find))
}
