pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod sweeper;

use axum::{Router, middleware::{from_fn, from_fn_with_state}, routing::get};
use crate::handlers::{health_handler, hello_handler, metrics_handler, podcasts_handler};
use crate::middleware::{cors_middleware, rate_limit_middleware};
use crate::state::AppState;

// Podcasts and hello are rate limited; health and metrics are not.
// CORS wraps everything, including unmatched paths.
pub fn build_router(state: AppState) -> Router {
    // layered on the GET method router only, so a 405 never takes a token
    let limit = from_fn_with_state(state.registry.clone(), rate_limit_middleware);

    Router::new()
        .route("/api/podcasts", get(podcasts_handler).route_layer(limit.clone()))
        .route("/api/hello", get(hello_handler).route_layer(limit))
        .route("/api/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(from_fn(cors_middleware))
        .with_state(state)
}
