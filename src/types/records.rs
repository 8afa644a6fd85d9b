//! Records served by the backend and rendered by the console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::{
    AccountStatus, DeviceStatus, ModuleStatus, OrganizationStatus, SubscriptionStatus,
};

// =============================================================================
// Plans
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl PlanType {
    pub fn label(&self) -> &'static str {
        match self {
            PlanType::Free => "Free",
            PlanType::Starter => "Starter",
            PlanType::Professional => "Professional",
            PlanType::Enterprise => "Enterprise",
        }
    }
}

/// A subscription plan offered to organizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Monthly price in USD
    pub price: f64,
    pub plan_type: PlanType,
    pub is_popular: bool,
    pub features: Vec<String>,
}

// =============================================================================
// Organizations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Tenant that owns devices, subscriptions and users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub industry: String,
    pub size: String,
    pub contact: Contact,
    pub address: Address,
    pub plan_id: String,
    pub status: OrganizationStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub contact: Contact,
    pub address: Address,
    pub plan_id: String,
}

// =============================================================================
// Devices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Temperature,
    Humidity,
    Motion,
    Pressure,
    AirQuality,
    Gateway,
}

impl DeviceKind {
    pub fn all() -> &'static [DeviceKind] {
        &[
            DeviceKind::Temperature,
            DeviceKind::Humidity,
            DeviceKind::Motion,
            DeviceKind::Pressure,
            DeviceKind::AirQuality,
            DeviceKind::Gateway,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            DeviceKind::Temperature => "temperature",
            DeviceKind::Humidity => "humidity",
            DeviceKind::Motion => "motion",
            DeviceKind::Pressure => "pressure",
            DeviceKind::AirQuality => "air_quality",
            DeviceKind::Gateway => "gateway",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::Temperature => "Temperature Sensor",
            DeviceKind::Humidity => "Humidity Sensor",
            DeviceKind::Motion => "Motion Sensor",
            DeviceKind::Pressure => "Pressure Sensor",
            DeviceKind::AirQuality => "Air Quality Monitor",
            DeviceKind::Gateway => "Gateway",
        }
    }

    pub fn from_key(key: &str) -> Option<DeviceKind> {
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        DeviceKind::all().iter().copied().find(|k| k.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    pub organization_id: String,
    pub firmware_version: String,
    /// Percent, absent for mains-powered devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    pub location: String,
    pub last_seen: DateTime<Utc>,
}

// =============================================================================
// Modules
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    Analytics,
    Alerts,
    Integration,
    Automation,
    Security,
}

impl ModuleCategory {
    pub fn all() -> &'static [ModuleCategory] {
        &[
            ModuleCategory::Analytics,
            ModuleCategory::Alerts,
            ModuleCategory::Integration,
            ModuleCategory::Automation,
            ModuleCategory::Security,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            ModuleCategory::Analytics => "analytics",
            ModuleCategory::Alerts => "alerts",
            ModuleCategory::Integration => "integration",
            ModuleCategory::Automation => "automation",
            ModuleCategory::Security => "security",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModuleCategory::Analytics => "Analytics",
            ModuleCategory::Alerts => "Alerts",
            ModuleCategory::Integration => "Integration",
            ModuleCategory::Automation => "Automation",
            ModuleCategory::Security => "Security",
        }
    }

    pub fn from_key(key: &str) -> Option<ModuleCategory> {
        let key = key.trim().to_ascii_lowercase();
        ModuleCategory::all().iter().copied().find(|c| c.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Free,
    OneTime,
    Subscription,
}

impl PricingModel {
    pub fn all() -> &'static [PricingModel] {
        &[
            PricingModel::Free,
            PricingModel::OneTime,
            PricingModel::Subscription,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            PricingModel::Free => "free",
            PricingModel::OneTime => "one_time",
            PricingModel::Subscription => "subscription",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PricingModel::Free => "Free",
            PricingModel::OneTime => "One-time purchase",
            PricingModel::Subscription => "Monthly subscription",
        }
    }

    pub fn from_key(key: &str) -> Option<PricingModel> {
        PricingModel::all().iter().copied().find(|m| m.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub model: PricingModel,
    pub price: f64,
}

impl Pricing {
    /// Short price text for list rows ("Free", "$49.00", "$9.99/mo")
    pub fn display(&self) -> String {
        match self.model {
            PricingModel::Free => "Free".to_string(),
            PricingModel::OneTime => format!("${:.2}", self.price),
            PricingModel::Subscription => format!("${:.2}/mo", self.price),
        }
    }
}

/// Marketplace add-on purchasable by organizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    pub category: ModuleCategory,
    pub version: String,
    pub description: String,
    pub pricing: Pricing,
    pub status: ModuleStatus,
    pub publisher: String,
    pub downloads: u64,
    pub rating: f32,
    #[serde(default)]
    pub compatible_devices: Vec<DeviceKind>,
}

/// Input for submitting a module to the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    pub name: String,
    pub category: ModuleCategory,
    pub version: String,
    pub description: String,
    pub package_url: String,
    pub pricing: Pricing,
    pub publisher: String,
    #[serde(default)]
    pub compatible_devices: Vec<DeviceKind>,
}

// =============================================================================
// Subscriptions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub organization_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub seats: u32,
    pub started_at: DateTime<Utc>,
    pub renews_at: DateTime<Utc>,
}

// =============================================================================
// Access control
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub key: String,
    pub name: String,
    pub description: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Permission keys granted by this role
    pub permissions: Vec<String>,
}

impl Role {
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission || p == "*")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_id: String,
    pub organization_id: String,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Input for registering a new account during signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Organization the account owns, when created together with one
    pub organization_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_serializes_with_camel_case_fields() {
        let plan = Plan {
            id: "plan-pro".to_string(),
            name: "Professional".to_string(),
            description: "For growing fleets".to_string(),
            price: 99.0,
            plan_type: PlanType::Professional,
            is_popular: true,
            features: vec!["100 devices".to_string()],
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["planType"], "professional");
        assert_eq!(json["isPopular"], true);
        assert_eq!(json["features"][0], "100 devices");
    }

    #[test]
    fn test_device_kind_from_key() {
        assert_eq!(DeviceKind::from_key("air-quality"), Some(DeviceKind::AirQuality));
        assert_eq!(DeviceKind::from_key("Gateway"), Some(DeviceKind::Gateway));
        assert_eq!(DeviceKind::from_key("toaster"), None);
    }

    #[test]
    fn test_pricing_display() {
        let free = Pricing {
            model: PricingModel::Free,
            price: 0.0,
        };
        let monthly = Pricing {
            model: PricingModel::Subscription,
            price: 9.5,
        };
        assert_eq!(free.display(), "Free");
        assert_eq!(monthly.display(), "$9.50/mo");
    }

    #[test]
    fn test_role_wildcard_grants_everything() {
        let admin = Role {
            id: "role-admin".to_string(),
            name: "Admin".to_string(),
            description: String::new(),
            permissions: vec!["*".to_string()],
        };
        assert!(admin.grants("devices.write"));
    }
}
