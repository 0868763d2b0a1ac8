use axum::{Json, response::IntoResponse};
use crate::models::HealthResponse;

// health handler - never rate limited
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::ok())
}
