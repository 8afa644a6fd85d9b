//! Status tags shared by every view and endpoint.
//!
//! Each enum is a closed set used to pick a label and a display tone. No
//! transition rules are enforced; records only carry their current tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Display tone for a status tag. The UI maps tones to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Positive,
    Neutral,
    Warning,
    Critical,
}

/// Common behavior for the status enums below.
pub trait StatusTag: Copy + Eq + fmt::Debug + 'static {
    /// Name of the tag set, used in parse errors ("device status")
    const KIND: &'static str;

    fn all() -> &'static [Self];
    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn tone(&self) -> Tone;

    /// Parse from a key. Case-insensitive, `-` and `_` are interchangeable.
    fn parse_key(value: &str) -> Result<Self, StatusParseError> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|s| s.key() == normalized)
            .ok_or_else(|| StatusParseError {
                kind: Self::KIND,
                value: value.to_string(),
                expected: Self::all()
                    .iter()
                    .map(StatusTag::key)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Unknown status value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct StatusParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
    Error,
}

impl StatusTag for DeviceStatus {
    const KIND: &'static str = "device status";

    fn all() -> &'static [Self] {
        &[
            DeviceStatus::Online,
            DeviceStatus::Offline,
            DeviceStatus::Maintenance,
            DeviceStatus::Error,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Maintenance => "maintenance",
            DeviceStatus::Error => "error",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "Online",
            DeviceStatus::Offline => "Offline",
            DeviceStatus::Maintenance => "Maintenance",
            DeviceStatus::Error => "Error",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            DeviceStatus::Online => Tone::Positive,
            DeviceStatus::Offline => Tone::Neutral,
            DeviceStatus::Maintenance => Tone::Warning,
            DeviceStatus::Error => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Expired,
}

impl StatusTag for SubscriptionStatus {
    const KIND: &'static str = "subscription status";

    fn all() -> &'static [Self] {
        &[
            SubscriptionStatus::Active,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Trialing => "Trial",
            SubscriptionStatus::PastDue => "Past Due",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Expired => "Expired",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            SubscriptionStatus::Active => Tone::Positive,
            SubscriptionStatus::Trialing => Tone::Neutral,
            SubscriptionStatus::PastDue => Tone::Warning,
            SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    Active,
    Pending,
    Suspended,
}

impl StatusTag for OrganizationStatus {
    const KIND: &'static str = "organization status";

    fn all() -> &'static [Self] {
        &[
            OrganizationStatus::Active,
            OrganizationStatus::Pending,
            OrganizationStatus::Suspended,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "active",
            OrganizationStatus::Pending => "pending",
            OrganizationStatus::Suspended => "suspended",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "Active",
            OrganizationStatus::Pending => "Pending Approval",
            OrganizationStatus::Suspended => "Suspended",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            OrganizationStatus::Active => Tone::Positive,
            OrganizationStatus::Pending => Tone::Warning,
            OrganizationStatus::Suspended => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Invited,
    Locked,
    Disabled,
}

impl AccountStatus {
    /// Whether an account in this state may sign in
    pub fn can_sign_in(&self) -> bool {
        matches!(self, AccountStatus::Active | AccountStatus::Invited)
    }
}

impl StatusTag for AccountStatus {
    const KIND: &'static str = "account status";

    fn all() -> &'static [Self] {
        &[
            AccountStatus::Active,
            AccountStatus::Invited,
            AccountStatus::Locked,
            AccountStatus::Disabled,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Invited => "invited",
            AccountStatus::Locked => "locked",
            AccountStatus::Disabled => "disabled",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Invited => "Invited",
            AccountStatus::Locked => "Locked",
            AccountStatus::Disabled => "Disabled",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            AccountStatus::Active => Tone::Positive,
            AccountStatus::Invited => Tone::Neutral,
            AccountStatus::Locked => Tone::Warning,
            AccountStatus::Disabled => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Draft,
    PendingReview,
    Published,
    Rejected,
}

impl StatusTag for ModuleStatus {
    const KIND: &'static str = "module status";

    fn all() -> &'static [Self] {
        &[
            ModuleStatus::Draft,
            ModuleStatus::PendingReview,
            ModuleStatus::Published,
            ModuleStatus::Rejected,
        ]
    }

    fn key(&self) -> &'static str {
        match self {
            ModuleStatus::Draft => "draft",
            ModuleStatus::PendingReview => "pending_review",
            ModuleStatus::Published => "published",
            ModuleStatus::Rejected => "rejected",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ModuleStatus::Draft => "Draft",
            ModuleStatus::PendingReview => "In Review",
            ModuleStatus::Published => "Published",
            ModuleStatus::Rejected => "Rejected",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            ModuleStatus::Draft => Tone::Neutral,
            ModuleStatus::PendingReview => Tone::Warning,
            ModuleStatus::Published => Tone::Positive,
            ModuleStatus::Rejected => Tone::Critical,
        }
    }
}

macro_rules! impl_display_and_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.key())
                }
            }

            impl FromStr for $ty {
                type Err = StatusParseError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as StatusTag>::parse_key(s)
                }
            }
        )*
    };
}

impl_display_and_from_str!(
    DeviceStatus,
    SubscriptionStatus,
    OrganizationStatus,
    AccountStatus,
    ModuleStatus,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_keys_round_trip<T: StatusTag + FromStr<Err = StatusParseError>>() {
        for status in T::all() {
            assert_eq!(status.key().parse::<T>().unwrap(), *status);
        }
    }

    #[test]
    fn test_every_key_parses_back() {
        assert_keys_round_trip::<DeviceStatus>();
        assert_keys_round_trip::<SubscriptionStatus>();
        assert_keys_round_trip::<OrganizationStatus>();
        assert_keys_round_trip::<AccountStatus>();
        assert_keys_round_trip::<ModuleStatus>();
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_dashes() {
        assert_eq!(
            "Past-Due".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            " PENDING_REVIEW ".parse::<ModuleStatus>().unwrap(),
            ModuleStatus::PendingReview
        );
    }

    #[test]
    fn test_unknown_status_lists_expected_keys() {
        let err = "rebooting".parse::<DeviceStatus>().unwrap_err();
        assert_eq!(err.kind, "device status");
        assert!(err.to_string().contains("online, offline, maintenance, error"));
    }

    #[test]
    fn test_serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
        let back: ModuleStatus = serde_json::from_str("\"pending_review\"").unwrap();
        assert_eq!(back, ModuleStatus::PendingReview);
    }

    #[test]
    fn test_only_active_and_invited_accounts_sign_in() {
        assert!(AccountStatus::Active.can_sign_in());
        assert!(AccountStatus::Invited.can_sign_in());
        assert!(!AccountStatus::Locked.can_sign_in());
        assert!(!AccountStatus::Disabled.can_sign_in());
    }
}
