use axum::Json;
use axum::response::IntoResponse;
use http::StatusCode;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "engine_version": loom_engine::VERSION,
        })),
    )
}
