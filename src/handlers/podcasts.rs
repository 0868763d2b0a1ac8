use axum::{
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::info;
use crate::error::GatewayError;
use crate::metrics::UPSTREAM_LATENCY;
use crate::state::AppState;

// Relay GET <upstream>/podcasts with the caller's query string, no retries
pub async fn podcasts_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    let mut target = state.podcasts_url.clone();
    target.set_query(query.as_deref());

    info!(url = %target, "Forwarding request");

    let start_time = Instant::now();
    let upstream = state.client.get(target).send().await?;
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let body = upstream.bytes().await?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
