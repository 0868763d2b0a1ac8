use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to fetch podcasts: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics output was not utf-8: {0}")]
    MetricsUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid upstream url {upstream:?}: {source}")]
    InvalidUpstream {
        upstream: String,
        #[source]
        source: url::ParseError,
    },
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Upstream(e) => {
                warn!(error = %e, "Upstream request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch podcasts").into_response()
            }
            GatewayError::Metrics(_) | GatewayError::MetricsUtf8(_) | GatewayError::InvalidUpstream { .. } => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
