//! Health check and status endpoints.

use axum::{extract::State, Json};

use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::error::ApiError;
use crate::rest::state::ApiState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get service status with record counts
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service status with record counts", body = StatusResponse),
        (status = 503, description = "Backend unavailable", body = crate::rest::error::ErrorResponse)
    )
)]
pub async fn status(State(state): State<ApiState>) -> Result<Json<StatusResponse>, ApiError> {
    let backend = &state.backend;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        plan_count: backend.list_plans().await?.len(),
        organization_count: backend.list_organizations().await?.len(),
        device_count: backend.list_devices().await?.len(),
        module_count: backend.list_modules().await?.len(),
        subscription_count: backend.list_subscriptions().await?.len(),
        user_count: backend.list_users().await?.len(),
    }))
}
