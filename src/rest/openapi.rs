//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::rest::dto::{
    CompletePasswordResetRequest, CreateModuleRequest, CreateOrganizationRequest,
    HealthResponse, MessageResponse, PasswordResetRequest, SignInRequest, StatusResponse,
    VerifyCodeRequest,
};
use crate::rest::error::ErrorResponse;
use crate::types::{
    AccountStatus, Address, Contact, Device, DeviceKind, DeviceStatus, Module, ModuleCategory,
    ModuleStatus, Organization, OrganizationStatus, Permission, Plan, PlanType, Pricing,
    PricingModel, Role, Subscription, SubscriptionStatus, User,
};

/// OpenAPI documentation for the Smart Sensor Flow REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart Sensor Flow API",
        version = "0.3.2",
        description = "Organizations, devices, marketplace modules, subscriptions and account recovery for the Smart Sensor Flow console.",
        license(name = "MIT")
    ),
    paths(
        // Health endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        // Plan endpoints
        crate::rest::routes::plans::list,
        crate::rest::routes::plans::get_one,
        // Organization endpoints
        crate::rest::routes::organizations::list,
        crate::rest::routes::organizations::get_one,
        crate::rest::routes::organizations::create,
        // Device endpoints
        crate::rest::routes::devices::list,
        crate::rest::routes::devices::get_one,
        // Module endpoints
        crate::rest::routes::modules::list,
        crate::rest::routes::modules::get_one,
        crate::rest::routes::modules::create,
        // Subscription endpoints
        crate::rest::routes::subscriptions::list,
        // Directory endpoints
        crate::rest::routes::directory::roles,
        crate::rest::routes::directory::permissions,
        crate::rest::routes::directory::users,
        // Auth endpoints
        crate::rest::routes::auth::request_reset,
        crate::rest::routes::auth::verify_code,
        crate::rest::routes::auth::complete_reset,
        crate::rest::routes::auth::sign_in,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            StatusResponse,
            MessageResponse,
            ErrorResponse,
            // Records
            Plan,
            PlanType,
            Organization,
            OrganizationStatus,
            Address,
            Contact,
            Device,
            DeviceKind,
            DeviceStatus,
            Module,
            ModuleCategory,
            ModuleStatus,
            Pricing,
            PricingModel,
            Subscription,
            SubscriptionStatus,
            Role,
            Permission,
            User,
            AccountStatus,
            // Request types
            CreateOrganizationRequest,
            CreateModuleRequest,
            PasswordResetRequest,
            VerifyCodeRequest,
            CompletePasswordResetRequest,
            SignInRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Plans", description = "Subscription plans"),
        (name = "Organizations", description = "Tenant organizations"),
        (name = "Devices", description = "Device inventory"),
        (name = "Modules", description = "Marketplace modules"),
        (name = "Subscriptions", description = "Organization subscriptions"),
        (name = "Directory", description = "Roles, permissions and users"),
        (name = "Auth", description = "Sign-in and password recovery"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::json().expect("Failed to generate OpenAPI spec");
        assert!(spec.contains("Smart Sensor Flow API"));
        assert!(spec.contains("/api/v1/health"));
        assert!(spec.contains("/api/v1/devices/{id}"));
        assert!(spec.contains("/api/v1/auth/password-reset/complete"));
    }

    #[test]
    fn test_openapi_has_all_tags() {
        let spec = ApiDoc::json().expect("Failed to generate OpenAPI spec");
        for tag in [
            "Health",
            "Plans",
            "Organizations",
            "Devices",
            "Modules",
            "Subscriptions",
            "Directory",
            "Auth",
        ] {
            assert!(spec.contains(&format!("\"{}\"", tag)), "missing tag {}", tag);
        }
    }
}
