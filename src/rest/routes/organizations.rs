//! Organization endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::rest::dto::CreateOrganizationRequest;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::routes::validate_steps;
use crate::rest::state::ApiState;
use crate::types::Organization;
use crate::wizard::flows::signup::{
    address_schema, organization_from_fields, organization_schema, SignupStep,
};
use crate::wizard::{FieldSpec, Rule, StepSchema};

fn contact_schema() -> StepSchema {
    StepSchema::new(vec![FieldSpec::new("email", "Contact email")
        .rule(Rule::Required)
        .rule(Rule::Email)])
}

fn plan_schema() -> StepSchema {
    StepSchema::new(vec![FieldSpec::new("plan_id", "Plan").rule(Rule::Required)])
}

/// List all organizations
#[utoipa::path(
    get,
    path = "/api/v1/organizations",
    tag = "Organizations",
    responses(
        (status = 200, description = "All organizations", body = Vec<Organization>)
    )
)]
pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Organization>>, ApiError> {
    Ok(Json(state.backend.list_organizations().await?))
}

/// Get a single organization
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}",
    tag = "Organizations",
    params(
        ("id" = String, Path, description = "Organization id")
    ),
    responses(
        (status = 200, description = "Organization found", body = Organization),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    Ok(Json(state.backend.get_organization(&id).await?))
}

/// Create an organization
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    tag = "Organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Unknown plan", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let fields = request.to_fields();
    validate_steps(
        &fields,
        vec![
            (SignupStep::Account, contact_schema()),
            (SignupStep::Organization, organization_schema()),
            (SignupStep::Address, address_schema()),
            (SignupStep::Plan, plan_schema()),
        ],
    )?;

    let organization = state
        .backend
        .create_organization(organization_from_fields(&fields))
        .await?;
    tracing::info!(id = %organization.id, name = %organization.name, "organization created via API");

    Ok((StatusCode::CREATED, Json(organization)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrganizationStatus;

    fn request() -> CreateOrganizationRequest {
        CreateOrganizationRequest {
            name: "Harbor Labs".to_string(),
            industry: "logistics".to_string(),
            size: "11-50".to_string(),
            email: "Ops@Harbor.example".to_string(),
            phone: "+1 555 010 3000".to_string(),
            website: Some("https://harbor.example".to_string()),
            street: "1 Pier Rd".to_string(),
            city: "Portland".to_string(),
            region: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
            plan_id: "plan-starter".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_organization() {
        let state = ApiState::seeded();
        let (status, Json(org)) = create(State(state.clone()), Json(request())).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(org.id.starts_with("org-"));
        assert_eq!(org.status, OrganizationStatus::Pending);
        assert_eq!(org.contact.email, "ops@harbor.example");

        let fetched = get_one(State(state), Path(org.id.clone())).await.unwrap();
        assert_eq!(fetched.name, "Harbor Labs");
    }

    #[tokio::test]
    async fn test_create_organization_reports_every_invalid_field() {
        let mut body = request();
        body.email = "not-an-email".to_string();
        body.industry = "mining".to_string();
        body.postal_code = String::new();

        let err = create(State(ApiState::seeded()), Json(body)).await.unwrap_err();
        match err {
            ApiError::Validation(report) => {
                assert_eq!(report.len(), 3);
                assert!(report.error("email").is_some());
                assert!(report.error("industry").is_some());
                assert!(report.error("postal_code").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_organization_with_unknown_plan() {
        let mut body = request();
        body.plan_id = "plan-gold".to_string();
        let err = create(State(ApiState::seeded()), Json(body)).await.unwrap_err();
        assert!(matches!(err, ApiError::Backend(crate::store::BackendError::NotFound(_))));
    }
}
