//! Data Transfer Objects for the REST API.
//!
//! Records from `types` are served as-is. Request bodies are flattened so
//! they can be checked with the same step schemas the wizards use.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::wizard::flows::module_upload::UploadStep;
use crate::wizard::flows::signup::SignupStep;
use crate::wizard::{FlowFields, StepFields};

fn step_fields(pairs: &[(&str, &str)]) -> StepFields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

// =============================================================================
// Health DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Service status with record counts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub plan_count: usize,
    pub organization_count: usize,
    pub device_count: usize,
    pub module_count: usize,
    pub subscription_count: usize,
    pub user_count: usize,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// Device list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceListParams {
    /// Status key (`online`, `offline`, ...) or `all`
    pub status: Option<String>,
    /// Case-insensitive text matched against name, serial number and location
    pub q: Option<String>,
    /// Sort key: name, status, kind, battery, last_seen
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

/// Module list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ModuleListParams {
    pub status: Option<String>,
    /// Category key (`analytics`, `alerts`, ...)
    pub category: Option<String>,
}

/// User list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    pub status: Option<String>,
}

// =============================================================================
// Organization DTOs
// =============================================================================

/// Request to create an organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub industry: String,
    pub size: String,
    /// Contact email of the organization
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub website: Option<String>,
    pub street: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub plan_id: String,
}

impl CreateOrganizationRequest {
    /// Lay the body out as signup wizard fields
    pub fn to_fields(&self) -> FlowFields<SignupStep> {
        let website = self.website.as_deref().unwrap_or("");
        let mut fields = FlowFields::new();
        fields.insert(SignupStep::Account, step_fields(&[("email", self.email.as_str())]));
        fields.insert(
            SignupStep::Organization,
            step_fields(&[
                ("name", self.name.as_str()),
                ("industry", self.industry.as_str()),
                ("size", self.size.as_str()),
                ("phone", self.phone.as_str()),
                ("website", website),
            ]),
        );
        fields.insert(
            SignupStep::Address,
            step_fields(&[
                ("street", self.street.as_str()),
                ("city", self.city.as_str()),
                ("region", self.region.as_str()),
                ("postal_code", self.postal_code.as_str()),
                ("country", self.country.as_str()),
            ]),
        );
        fields.insert(SignupStep::Plan, step_fields(&[("plan_id", self.plan_id.as_str())]));
        fields
    }
}

// =============================================================================
// Module DTOs
// =============================================================================

/// Request to submit a marketplace module
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    pub name: String,
    pub category: String,
    pub version: String,
    pub description: String,
    pub package_url: String,
    #[serde(default)]
    pub compatible_devices: Vec<String>,
    /// `free`, `one_time` or `subscription`
    pub pricing_model: String,
    #[serde(default)]
    pub price: f64,
    pub publisher: String,
}

impl CreateModuleRequest {
    /// Lay the body out as module submission wizard fields
    pub fn to_fields(&self) -> FlowFields<UploadStep> {
        let devices = self.compatible_devices.join(", ");
        let price = format!("{}", self.price);
        let mut fields = FlowFields::new();
        fields.insert(
            UploadStep::Details,
            step_fields(&[
                ("name", self.name.as_str()),
                ("category", self.category.as_str()),
                ("description", self.description.as_str()),
            ]),
        );
        fields.insert(
            UploadStep::Package,
            step_fields(&[
                ("version", self.version.as_str()),
                ("package_url", self.package_url.as_str()),
                ("devices", devices.as_str()),
            ]),
        );
        fields.insert(
            UploadStep::Pricing,
            step_fields(&[("model", self.pricing_model.as_str()), ("price", price.as_str())]),
        );
        fields.insert(
            UploadStep::Review,
            step_fields(&[("publisher", self.publisher.as_str())]),
        );
        fields
    }
}

// =============================================================================
// Auth DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompletePasswordResetRequest {
    pub email: String,
    pub code: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}
