use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

use crate::identity::client_identifier;
use crate::metrics::{RATE_LIMITED, REQUEST_TOTAL};
use crate::rate_limit::RateLimitRegistry;

const UNKNOWN_PEER: &str = "unknown";

// Admission check - 429 immediately when the client's bucket is empty, never queues
pub async fn rate_limit_middleware(
    State(registry): State<Arc<RateLimitRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| UNKNOWN_PEER.to_string());
    let client_id = client_identifier(req.headers(), &peer);

    let limiter = registry.acquire(&client_id);
    if !limiter.try_acquire() {
        RATE_LIMITED.inc();
        debug!(client = %client_id, path = %req.uri().path(), "Rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }

    next.run(req).await
}

// Permissive CORS on every response; any OPTIONS is answered here
pub async fn cors_middleware(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
