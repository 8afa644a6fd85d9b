//! Built-in demo data for the mock backend.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountStatus, Address, Contact, Device, DeviceKind, DeviceStatus, Module, ModuleCategory,
    ModuleStatus, Organization, OrganizationStatus, Permission, Plan, PlanType, Pricing,
    PricingModel, Role, Subscription, SubscriptionStatus, User,
};

/// Password of every seeded account
pub const DEMO_PASSWORD: &str = "Sensor#2024";

/// Stored sign-in secret for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: String,
    pub email: String,
    /// Hex SHA-256 of the password
    pub password_hash: String,
}

/// Full backend contents. Also the shape of a fixtures file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockData {
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl MockData {
    /// Demo tenant data
    pub fn seeded() -> Self {
        let now = Utc::now();
        let users = users(now);
        let credentials = users
            .iter()
            .map(|u| Credential {
                user_id: u.id.clone(),
                email: u.email.clone(),
                password_hash: super::memory::hash_password(DEMO_PASSWORD),
            })
            .collect();

        Self {
            plans: plans(),
            organizations: organizations(now),
            devices: devices(now),
            modules: modules(),
            subscriptions: subscriptions(now),
            roles: roles(),
            permissions: permissions(),
            users,
            credentials,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn plans() -> Vec<Plan> {
    vec![
        Plan {
            id: "plan-free".to_string(),
            name: "Free".to_string(),
            description: "Try Smart Sensor Flow with a handful of sensors".to_string(),
            price: 0.0,
            plan_type: PlanType::Free,
            is_popular: false,
            features: strings(&["Up to 5 devices", "24h data retention", "Community support"]),
        },
        Plan {
            id: "plan-starter".to_string(),
            name: "Starter".to_string(),
            description: "For small sites getting started with monitoring".to_string(),
            price: 29.0,
            plan_type: PlanType::Starter,
            is_popular: false,
            features: strings(&[
                "Up to 50 devices",
                "30 day data retention",
                "Email alerts",
            ]),
        },
        Plan {
            id: "plan-pro".to_string(),
            name: "Professional".to_string(),
            description: "Multi-site fleets with automation and integrations".to_string(),
            price: 99.0,
            plan_type: PlanType::Professional,
            is_popular: true,
            features: strings(&[
                "Up to 500 devices",
                "1 year data retention",
                "Marketplace modules",
                "Role-based access",
            ]),
        },
        Plan {
            id: "plan-enterprise".to_string(),
            name: "Enterprise".to_string(),
            description: "Unlimited scale, SSO and a dedicated success team".to_string(),
            price: 499.0,
            plan_type: PlanType::Enterprise,
            is_popular: false,
            features: strings(&[
                "Unlimited devices",
                "Unlimited retention",
                "SSO / SAML",
                "24/7 support",
            ]),
        },
    ]
}

fn organizations(now: DateTime<Utc>) -> Vec<Organization> {
    vec![
        Organization {
            id: "org-acme".to_string(),
            name: "Acme Cold Chain".to_string(),
            industry: "logistics".to_string(),
            size: "51-200".to_string(),
            contact: Contact {
                email: "ops@acme-coldchain.example".to_string(),
                phone: "+1 (555) 010-2030".to_string(),
                website: Some("https://acme-coldchain.example".to_string()),
            },
            address: Address {
                street: "100 Harbor Way".to_string(),
                city: "Oakland".to_string(),
                region: "CA".to_string(),
                postal_code: "94607".to_string(),
                country: "US".to_string(),
            },
            plan_id: "plan-pro".to_string(),
            status: OrganizationStatus::Active,
            created_at: now - Duration::days(410),
        },
        Organization {
            id: "org-greenleaf".to_string(),
            name: "GreenLeaf Farms".to_string(),
            industry: "agriculture".to_string(),
            size: "11-50".to_string(),
            contact: Contact {
                email: "hello@greenleaf.example".to_string(),
                phone: "+31 20 555 0199".to_string(),
                website: None,
            },
            address: Address {
                street: "Polderweg 12".to_string(),
                city: "Almere".to_string(),
                region: "Flevoland".to_string(),
                postal_code: "1331 AB".to_string(),
                country: "NL".to_string(),
            },
            plan_id: "plan-starter".to_string(),
            status: OrganizationStatus::Active,
            created_at: now - Duration::days(95),
        },
        Organization {
            id: "org-metro".to_string(),
            name: "Metro Facilities Group".to_string(),
            industry: "facilities".to_string(),
            size: "201-1000".to_string(),
            contact: Contact {
                email: "it@metrofacilities.example".to_string(),
                phone: "+44 20 7946 0321".to_string(),
                website: Some("https://metrofacilities.example".to_string()),
            },
            address: Address {
                street: "8 Canal Street".to_string(),
                city: "Manchester".to_string(),
                region: "Greater Manchester".to_string(),
                postal_code: "M1 3HE".to_string(),
                country: "GB".to_string(),
            },
            plan_id: "plan-enterprise".to_string(),
            status: OrganizationStatus::Pending,
            created_at: now - Duration::days(3),
        },
    ]
}

fn devices(now: DateTime<Utc>) -> Vec<Device> {
    // (name, kind, status, org, battery, location, minutes since last report)
    let rows: &[(&str, DeviceKind, DeviceStatus, &str, Option<u8>, &str, i64)] = &[
        ("Freezer A1", DeviceKind::Temperature, DeviceStatus::Online, "org-acme", Some(88), "Warehouse 1", 1),
        ("Freezer A2", DeviceKind::Temperature, DeviceStatus::Online, "org-acme", Some(64), "Warehouse 1", 2),
        ("Freezer B1", DeviceKind::Temperature, DeviceStatus::Error, "org-acme", Some(9), "Warehouse 2", 95),
        ("Dock Door Motion", DeviceKind::Motion, DeviceStatus::Online, "org-acme", Some(71), "Loading Dock", 4),
        ("Cold Room Humidity", DeviceKind::Humidity, DeviceStatus::Maintenance, "org-acme", Some(45), "Warehouse 2", 600),
        ("Yard Gateway", DeviceKind::Gateway, DeviceStatus::Online, "org-acme", None, "Yard", 1),
        ("Truck 12 Probe", DeviceKind::Temperature, DeviceStatus::Offline, "org-acme", Some(23), "Fleet", 1440),
        ("Greenhouse 1 Climate", DeviceKind::Humidity, DeviceStatus::Online, "org-greenleaf", Some(92), "Greenhouse 1", 3),
        ("Greenhouse 1 CO2", DeviceKind::AirQuality, DeviceStatus::Online, "org-greenleaf", Some(80), "Greenhouse 1", 3),
        ("Greenhouse 2 Climate", DeviceKind::Humidity, DeviceStatus::Offline, "org-greenleaf", Some(0), "Greenhouse 2", 4320),
        ("Irrigation Pressure", DeviceKind::Pressure, DeviceStatus::Online, "org-greenleaf", Some(57), "Pump House", 6),
        ("Farm Gateway", DeviceKind::Gateway, DeviceStatus::Online, "org-greenleaf", None, "Barn", 1),
        ("Lobby Air Quality", DeviceKind::AirQuality, DeviceStatus::Online, "org-metro", Some(99), "HQ Lobby", 2),
        ("Boiler Pressure", DeviceKind::Pressure, DeviceStatus::Maintenance, "org-metro", None, "Plant Room", 180),
        ("Server Room Temp", DeviceKind::Temperature, DeviceStatus::Online, "org-metro", Some(76), "Level 3", 1),
        ("Stairwell Motion", DeviceKind::Motion, DeviceStatus::Error, "org-metro", Some(14), "Stairwell B", 240),
        ("Roof Gateway", DeviceKind::Gateway, DeviceStatus::Offline, "org-metro", None, "Roof", 2880),
        ("Parking Motion", DeviceKind::Motion, DeviceStatus::Online, "org-metro", Some(61), "Car Park", 5),
    ];

    rows.iter()
        .enumerate()
        .map(
            |(i, (name, kind, status, org, battery, location, minutes))| Device {
                id: format!("dev-{:03}", i + 1),
                name: (*name).to_string(),
                serial_number: format!("SSF-{}-{:05}", kind.key().to_uppercase(), 1042 + i * 37),
                kind: *kind,
                status: *status,
                organization_id: (*org).to_string(),
                firmware_version: if *kind == DeviceKind::Gateway {
                    "4.2.1".to_string()
                } else {
                    format!("2.{}.0", i % 4)
                },
                battery_level: *battery,
                location: (*location).to_string(),
                last_seen: now - Duration::minutes(*minutes),
            },
        )
        .collect()
}

fn modules() -> Vec<Module> {
    let module = |id: &str,
                  name: &str,
                  category: ModuleCategory,
                  description: &str,
                  pricing: (PricingModel, f64),
                  status: ModuleStatus,
                  downloads: u64,
                  rating: f32,
                  devices: &[DeviceKind]| Module {
        id: id.to_string(),
        name: name.to_string(),
        category,
        version: "1.0.0".to_string(),
        description: description.to_string(),
        pricing: Pricing {
            model: pricing.0,
            price: pricing.1,
        },
        status,
        publisher: "Smart Sensor Flow".to_string(),
        downloads,
        rating,
        compatible_devices: devices.to_vec(),
    };

    vec![
        module(
            "mod-cold-chain",
            "Cold Chain Compliance",
            ModuleCategory::Analytics,
            "HACCP-ready temperature excursion reports for cold storage and transport.",
            (PricingModel::Subscription, 19.0),
            ModuleStatus::Published,
            1840,
            4.7,
            &[DeviceKind::Temperature, DeviceKind::Humidity],
        ),
        module(
            "mod-sms-alerts",
            "SMS Alerts",
            ModuleCategory::Alerts,
            "Escalating SMS and voice alerts when thresholds are crossed.",
            (PricingModel::Subscription, 9.0),
            ModuleStatus::Published,
            5230,
            4.5,
            &[],
        ),
        module(
            "mod-slack",
            "Slack Connector",
            ModuleCategory::Integration,
            "Post device events and daily summaries to Slack channels.",
            (PricingModel::Free, 0.0),
            ModuleStatus::Published,
            7711,
            4.2,
            &[],
        ),
        module(
            "mod-hvac-auto",
            "HVAC Autopilot",
            ModuleCategory::Automation,
            "Closed-loop HVAC setpoint adjustment from occupancy and air quality.",
            (PricingModel::Subscription, 49.0),
            ModuleStatus::Published,
            612,
            4.8,
            &[DeviceKind::AirQuality, DeviceKind::Motion, DeviceKind::Temperature],
        ),
        module(
            "mod-leak-detect",
            "Leak Detection",
            ModuleCategory::Analytics,
            "Detect pressure drops that indicate pipe leaks before they flood.",
            (PricingModel::OneTime, 149.0),
            ModuleStatus::PendingReview,
            0,
            0.0,
            &[DeviceKind::Pressure],
        ),
        module(
            "mod-tamper",
            "Tamper Guard",
            ModuleCategory::Security,
            "Flags gateway and sensor tampering from motion and connectivity patterns.",
            (PricingModel::Subscription, 15.0),
            ModuleStatus::Published,
            948,
            4.1,
            &[DeviceKind::Gateway, DeviceKind::Motion],
        ),
        module(
            "mod-sap",
            "SAP PM Bridge",
            ModuleCategory::Integration,
            "Open SAP maintenance orders when devices enter maintenance.",
            (PricingModel::OneTime, 999.0),
            ModuleStatus::Draft,
            0,
            0.0,
            &[],
        ),
        module(
            "mod-crypto-miner",
            "Fleet Miner",
            ModuleCategory::Automation,
            "Rejected submission kept for audit purposes.",
            (PricingModel::Free, 0.0),
            ModuleStatus::Rejected,
            0,
            0.0,
            &[],
        ),
    ]
}

fn subscriptions(now: DateTime<Utc>) -> Vec<Subscription> {
    vec![
        Subscription {
            id: "sub-1001".to_string(),
            organization_id: "org-acme".to_string(),
            plan_id: "plan-pro".to_string(),
            status: SubscriptionStatus::Active,
            seats: 25,
            started_at: now - Duration::days(410),
            renews_at: now + Duration::days(20),
        },
        Subscription {
            id: "sub-1002".to_string(),
            organization_id: "org-greenleaf".to_string(),
            plan_id: "plan-starter".to_string(),
            status: SubscriptionStatus::PastDue,
            seats: 5,
            started_at: now - Duration::days(95),
            renews_at: now - Duration::days(2),
        },
        Subscription {
            id: "sub-1003".to_string(),
            organization_id: "org-metro".to_string(),
            plan_id: "plan-enterprise".to_string(),
            status: SubscriptionStatus::Trialing,
            seats: 100,
            started_at: now - Duration::days(3),
            renews_at: now + Duration::days(11),
        },
    ]
}

fn permissions() -> Vec<Permission> {
    let p = |key: &str, name: &str, description: &str, group: &str| Permission {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        group: group.to_string(),
    };
    vec![
        p("devices.read", "View devices", "See device inventory and readings", "devices"),
        p("devices.write", "Manage devices", "Register, rename and decommission devices", "devices"),
        p("modules.read", "Browse marketplace", "View marketplace modules", "modules"),
        p("modules.install", "Install modules", "Install and remove modules", "modules"),
        p("modules.publish", "Publish modules", "Submit modules for review", "modules"),
        p("billing.read", "View billing", "See plan, invoices and usage", "billing"),
        p("billing.write", "Manage billing", "Change plan and payment details", "billing"),
        p("users.read", "View users", "See team members and roles", "users"),
        p("users.write", "Manage users", "Invite, lock and remove users", "users"),
        p("org.write", "Manage organization", "Edit organization profile and address", "organization"),
    ]
}

fn roles() -> Vec<Role> {
    vec![
        Role {
            id: "role-owner".to_string(),
            name: "Owner".to_string(),
            description: "Full access including billing".to_string(),
            permissions: strings(&["*"]),
        },
        Role {
            id: "role-admin".to_string(),
            name: "Administrator".to_string(),
            description: "Manage devices, modules and users".to_string(),
            permissions: strings(&[
                "devices.read",
                "devices.write",
                "modules.read",
                "modules.install",
                "users.read",
                "users.write",
            ]),
        },
        Role {
            id: "role-technician".to_string(),
            name: "Technician".to_string(),
            description: "Maintain the device fleet".to_string(),
            permissions: strings(&["devices.read", "devices.write", "modules.read"]),
        },
        Role {
            id: "role-viewer".to_string(),
            name: "Viewer".to_string(),
            description: "Read-only dashboards".to_string(),
            permissions: strings(&["devices.read", "modules.read", "billing.read"]),
        },
    ]
}

fn users(now: DateTime<Utc>) -> Vec<User> {
    let rows: &[(&str, &str, &str, &str, AccountStatus, Option<i64>)] = &[
        ("Dana Whitfield", "dana@acme-coldchain.example", "role-owner", "org-acme", AccountStatus::Active, Some(30)),
        ("Luis Ortega", "luis@acme-coldchain.example", "role-technician", "org-acme", AccountStatus::Active, Some(600)),
        ("Priya Raman", "priya@acme-coldchain.example", "role-viewer", "org-acme", AccountStatus::Invited, None),
        ("Joris de Vries", "joris@greenleaf.example", "role-owner", "org-greenleaf", AccountStatus::Active, Some(1500)),
        ("Anouk Bakker", "anouk@greenleaf.example", "role-technician", "org-greenleaf", AccountStatus::Locked, Some(20_000)),
        ("Sam Okafor", "sam@metrofacilities.example", "role-admin", "org-metro", AccountStatus::Active, Some(90)),
        ("Grace Liu", "grace@metrofacilities.example", "role-viewer", "org-metro", AccountStatus::Disabled, Some(90_000)),
        ("Demo User", "user@example.com", "role-admin", "org-acme", AccountStatus::Active, Some(5)),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (name, email, role, org, status, login))| User {
            id: format!("usr-{:03}", i + 1),
            name: (*name).to_string(),
            email: (*email).to_string(),
            role_id: (*role).to_string(),
            organization_id: (*org).to_string(),
            status: *status,
            last_login: login.map(|m| now - Duration::minutes(m)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seeded_ids_are_unique() {
        let data = MockData::seeded();
        let device_ids: HashSet<_> = data.devices.iter().map(|d| &d.id).collect();
        assert_eq!(device_ids.len(), data.devices.len());
        let user_ids: HashSet<_> = data.users.iter().map(|u| &u.id).collect();
        assert_eq!(user_ids.len(), data.users.len());
    }

    #[test]
    fn test_seeded_references_resolve() {
        let data = MockData::seeded();
        let org_ids: HashSet<_> = data.organizations.iter().map(|o| o.id.as_str()).collect();
        let plan_ids: HashSet<_> = data.plans.iter().map(|p| p.id.as_str()).collect();
        let role_ids: HashSet<_> = data.roles.iter().map(|r| r.id.as_str()).collect();

        assert!(data.devices.iter().all(|d| org_ids.contains(d.organization_id.as_str())));
        assert!(data.organizations.iter().all(|o| plan_ids.contains(o.plan_id.as_str())));
        assert!(data.users.iter().all(|u| role_ids.contains(u.role_id.as_str())));
        assert!(data
            .subscriptions
            .iter()
            .all(|s| plan_ids.contains(s.plan_id.as_str())));
    }

    #[test]
    fn test_every_user_has_a_credential() {
        let data = MockData::seeded();
        assert_eq!(data.credentials.len(), data.users.len());
    }

    #[test]
    fn test_exactly_one_popular_plan() {
        let data = MockData::seeded();
        assert_eq!(data.plans.iter().filter(|p| p.is_popular).count(), 1);
    }
}
