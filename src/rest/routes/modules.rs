//! Marketplace module endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::listing::{ListQuery, ModuleSort, SortSpec, StatusFilter};
use crate::rest::dto::{CreateModuleRequest, ModuleListParams};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::routes::{parse_param, validate_steps};
use crate::rest::state::ApiState;
use crate::types::{Module, ModuleCategory, ModuleStatus};
use crate::wizard::flows::module_upload::{module_from_fields, step_schema, UploadStep};
use crate::wizard::field_value;
use crate::wizard::{FieldSpec, Rule, StepSchema};

fn publisher_schema() -> StepSchema {
    StepSchema::new(vec![FieldSpec::new("publisher", "Publisher")
        .rule(Rule::Required)
        .rule(Rule::MaxLength(80))])
}

/// List marketplace modules, optionally by status and category
#[utoipa::path(
    get,
    path = "/api/v1/modules",
    tag = "Modules",
    params(ModuleListParams),
    responses(
        (status = 200, description = "Matching modules sorted by name", body = Vec<Module>),
        (status = 400, description = "Unknown status or category", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    Query(params): Query<ModuleListParams>,
) -> Result<Json<Vec<Module>>, ApiError> {
    let status: StatusFilter<ModuleStatus> =
        parse_param(params.status.as_deref(), StatusFilter::parse)?.unwrap_or_default();
    let category = parse_param(params.category.as_deref(), |key| {
        ModuleCategory::from_key(key).ok_or_else(|| format!("unknown module category '{}'", key))
    })?;

    let query = ListQuery::new()
        .status(status)
        .sort(SortSpec::ascending(ModuleSort::Name));
    let modules = query
        .apply(&state.backend.list_modules().await?)
        .into_iter()
        .filter(|m| category.map_or(true, |c| m.category == c))
        .collect();

    Ok(Json(modules))
}

/// Get a single module
#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}",
    tag = "Modules",
    params(
        ("id" = String, Path, description = "Module id")
    ),
    responses(
        (status = 200, description = "Module found", body = Module),
        (status = 404, description = "Module not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Module>, ApiError> {
    Ok(Json(state.backend.get_module(&id).await?))
}

/// Submit a module for review
#[utoipa::path(
    post,
    path = "/api/v1/modules",
    tag = "Modules",
    request_body = CreateModuleRequest,
    responses(
        (status = 201, description = "Module submitted with status pending_review", body = Module),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Price does not fit the pricing model, or version already submitted", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(request): Json<CreateModuleRequest>,
) -> Result<(StatusCode, Json<Module>), ApiError> {
    let fields = request.to_fields();
    validate_steps(
        &fields,
        vec![
            (UploadStep::Details, step_schema(UploadStep::Details)),
            (UploadStep::Package, step_schema(UploadStep::Package)),
            (UploadStep::Pricing, step_schema(UploadStep::Pricing)),
            (UploadStep::Review, publisher_schema()),
        ],
    )?;

    let publisher = field_value(&fields, UploadStep::Review, "publisher");
    let module = state
        .backend
        .submit_module(module_from_fields(&fields, publisher)?)
        .await?;

    Ok((StatusCode::CREATED, Json(module)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BackendError;

    fn request() -> CreateModuleRequest {
        CreateModuleRequest {
            name: "Leak Sentinel".to_string(),
            category: "alerts".to_string(),
            version: "1.0.0".to_string(),
            description: "Detects leaks early and pages on-call".to_string(),
            package_url: "https://pkg.example.com/leak.zip".to_string(),
            compatible_devices: vec!["humidity".to_string()],
            pricing_model: "one_time".to_string(),
            price: 12.5,
            publisher: "Acme".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let Json(modules) = list(
            State(ApiState::seeded()),
            Query(ModuleListParams {
                status: None,
                category: Some("alerts".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(!modules.is_empty());
        assert!(modules.iter().all(|m| m.category == ModuleCategory::Alerts));
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_category() {
        let result = list(
            State(ApiState::seeded()),
            Query(ModuleListParams {
                status: None,
                category: Some("games".to_string()),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_module_is_pending_review() {
        let (status, Json(module)) = create(State(ApiState::seeded()), Json(request()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(module.status, ModuleStatus::PendingReview);
        assert_eq!(module.downloads, 0);
    }

    #[tokio::test]
    async fn test_create_paid_module_without_price_conflicts() {
        let mut body = request();
        body.price = 0.0;
        let err = create(State(ApiState::seeded()), Json(body)).await.unwrap_err();
        assert!(matches!(err, ApiError::Backend(BackendError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_module_validates_fields() {
        let mut body = request();
        body.version = "one".to_string();
        body.compatible_devices = vec!["toaster".to_string()];
        body.publisher = String::new();

        match create(State(ApiState::seeded()), Json(body)).await.unwrap_err() {
            ApiError::Validation(report) => {
                assert!(report.error("version").is_some());
                assert!(report.error("devices").is_some());
                assert!(report.error("publisher").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
