//! Device inventory endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::listing::{DeviceSort, ListQuery, SortKey, SortOrder, SortSpec, StatusFilter};
use crate::rest::dto::DeviceListParams;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::routes::parse_param;
use crate::rest::state::ApiState;
use crate::types::{Device, DeviceStatus};

/// Translate query parameters into a list query. Defaults: every status,
/// sorted by name ascending.
pub fn device_query(params: &DeviceListParams) -> Result<ListQuery<Device>, ApiError> {
    let status: StatusFilter<DeviceStatus> =
        parse_param(params.status.as_deref(), StatusFilter::parse)?.unwrap_or_default();
    let key = parse_param(params.sort.as_deref(), DeviceSort::parse_key)?
        .unwrap_or(DeviceSort::Name);
    let order =
        parse_param(params.order.as_deref(), str::parse::<SortOrder>)?.unwrap_or_default();

    Ok(ListQuery::new()
        .status(status)
        .text(params.q.clone().unwrap_or_default())
        .sort(SortSpec { key, order }))
}

/// List devices with optional filtering and sorting
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Devices",
    params(DeviceListParams),
    responses(
        (status = 200, description = "Matching devices", body = Vec<Device>),
        (status = 400, description = "Unknown status, sort key or order", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    Query(params): Query<DeviceListParams>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let query = device_query(&params)?;
    let devices = state.backend.list_devices().await?;
    Ok(Json(query.apply(&devices)))
}

/// Get a single device
#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}",
    tag = "Devices",
    params(
        ("id" = String, Path, description = "Device id (e.g., dev-001)")
    ),
    responses(
        (status = 200, description = "Device found", body = Device),
        (status = 404, description = "Device not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.backend.get_device(&id).await?))
}
