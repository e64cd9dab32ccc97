use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors reported to the caller of `/invoke`
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Request body is not valid JSON or has the wrong shape
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Request is well-formed but names something the bridge cannot build
    #[error("{0}")]
    InvalidRequest(String),

    /// The module failed while running
    #[error("{0}")]
    Execution(String),
}

impl BridgeError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
