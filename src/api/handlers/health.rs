use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub local_store: String,
    pub remote: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let local_status = match tokio::fs::metadata(state.file_service.local().root()).await {
        Ok(m) if m.is_dir() => "available",
        _ => "unavailable",
    };

    let remote_status = match state.remote.authenticate().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach remote storage: {}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        local_store: local_status.to_string(),
        remote: remote_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
