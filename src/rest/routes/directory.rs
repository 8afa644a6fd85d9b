//! Role, permission and user directory endpoints.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::listing::{filter_by_status, StatusFilter};
use crate::rest::dto::UserListParams;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::routes::parse_param;
use crate::rest::state::ApiState;
use crate::types::{AccountStatus, Permission, Role, User};

/// List roles
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "Directory",
    responses(
        (status = 200, description = "All roles", body = Vec<Role>)
    )
)]
pub async fn roles(State(state): State<ApiState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.backend.list_roles().await?))
}

/// List permissions
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    tag = "Directory",
    responses(
        (status = 200, description = "All permissions", body = Vec<Permission>)
    )
)]
pub async fn permissions(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    Ok(Json(state.backend.list_permissions().await?))
}

/// List users, optionally by account status
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Directory",
    params(UserListParams),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 400, description = "Unknown status", body = ErrorResponse)
    )
)]
pub async fn users(
    State(state): State<ApiState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<User>>, ApiError> {
    let status: StatusFilter<AccountStatus> =
        parse_param(params.status.as_deref(), StatusFilter::parse)?.unwrap_or_default();
    let users = state.backend.list_users().await?;
    Ok(Json(filter_by_status(&users, status)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_users_filtered_by_status() {
        let Json(locked) = users(
            State(ApiState::seeded()),
            Query(UserListParams {
                status: Some("locked".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].email, "anouk@greenleaf.example");
    }

    #[tokio::test]
    async fn test_all_users() {
        let Json(all) = users(State(ApiState::seeded()), Query(UserListParams::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_roles_reference_known_permissions() {
        let state = ApiState::seeded();
        let Json(roles) = roles(State(state.clone())).await.unwrap();
        let Json(permissions) = permissions(State(state)).await.unwrap();

        for role in &roles {
            for key in role.permissions.iter().filter(|k| k.as_str() != "*") {
                assert!(
                    permissions.iter().any(|p| &p.key == key),
                    "role {} grants unknown permission {}",
                    role.id,
                    key
                );
            }
        }
    }
}
