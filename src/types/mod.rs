//! Domain types shared by the backend, REST API and terminal UI.

pub mod records;
pub mod status;

pub use records::{
    Address, Contact, Device, DeviceKind, Module, ModuleCategory, NewAccount, NewModule,
    NewOrganization, Organization, Permission, Plan, PlanType, Pricing, PricingModel, Role,
    Subscription, User,
};
pub use status::{
    AccountStatus, DeviceStatus, ModuleStatus, OrganizationStatus, StatusParseError, StatusTag,
    SubscriptionStatus, Tone,
};
