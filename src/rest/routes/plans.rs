//! Subscription plan endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::types::Plan;

/// List all plans
#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "Plans",
    responses(
        (status = 200, description = "Available plans", body = Vec<Plan>)
    )
)]
pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Plan>>, ApiError> {
    Ok(Json(state.backend.list_plans().await?))
}

/// Get a single plan
#[utoipa::path(
    get,
    path = "/api/v1/plans/{id}",
    tag = "Plans",
    params(
        ("id" = String, Path, description = "Plan id (e.g., plan-pro)")
    ),
    responses(
        (status = 200, description = "Plan found", body = Plan),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Plan>, ApiError> {
    Ok(Json(state.backend.get_plan(&id).await?))
}
