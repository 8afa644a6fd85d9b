//! Subscription endpoints.

use axum::{extract::State, Json};

use crate::rest::error::ApiError;
use crate::rest::state::ApiState;
use crate::types::Subscription;

/// List all subscriptions
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "All subscriptions", body = Vec<Subscription>)
    )
)]
pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Subscription>>, ApiError> {
    Ok(Json(state.backend.list_subscriptions().await?))
}
