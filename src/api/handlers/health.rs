use crate::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub upload_dir: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upload_dir = if state.uploads.storage().is_writable().await {
        "writable"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        upload_dir: upload_dir.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
