//! Data-access traits.
//!
//! Views, wizards and REST handlers only talk to these traits. The mock
//! backend implements all of them; a real service client can replace it
//! without touching presentation code.

use async_trait::async_trait;

use super::error::BackendError;
use crate::types::{
    Device, Module, NewAccount, NewModule, NewOrganization, Organization, Permission, Plan, Role,
    Subscription, User,
};

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list_plans(&self) -> BackendResult<Vec<Plan>>;

    async fn get_plan(&self, id: &str) -> BackendResult<Plan>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn list_organizations(&self) -> BackendResult<Vec<Organization>>;

    async fn get_organization(&self, id: &str) -> BackendResult<Organization>;

    /// Create an organization. The returned record carries the new id.
    async fn create_organization(&self, input: NewOrganization) -> BackendResult<Organization>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn list_devices(&self) -> BackendResult<Vec<Device>>;

    async fn get_device(&self, id: &str) -> BackendResult<Device>;
}

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn list_modules(&self) -> BackendResult<Vec<Module>>;

    async fn get_module(&self, id: &str) -> BackendResult<Module>;

    /// Submit a module for review
    async fn submit_module(&self, input: NewModule) -> BackendResult<Module>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn list_subscriptions(&self) -> BackendResult<Vec<Subscription>>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn list_roles(&self) -> BackendResult<Vec<Role>>;

    async fn list_permissions(&self) -> BackendResult<Vec<Permission>>;

    async fn list_users(&self) -> BackendResult<Vec<User>>;
}

/// Account lifecycle: signup, sign-in and password recovery
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Fails with `DuplicateEmail` if the address is taken
    async fn check_email_available(&self, email: &str) -> BackendResult<()>;

    async fn register_account(&self, input: NewAccount) -> BackendResult<User>;

    /// Create an organization together with its owner account. Either both
    /// are stored or neither is; the account is linked to the new organization.
    async fn sign_up(
        &self,
        organization: NewOrganization,
        account: NewAccount,
    ) -> BackendResult<(Organization, User)>;

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<User>;

    /// Issue a reset code for `email`. Unknown addresses succeed silently so
    /// the response does not reveal which emails are registered.
    async fn request_password_reset(&self, email: &str) -> BackendResult<()>;

    async fn verify_reset_code(&self, email: &str, code: &str) -> BackendResult<()>;

    async fn complete_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> BackendResult<()>;
}

/// Everything the console needs from a backend
pub trait Backend:
    PlanRepository
    + OrganizationRepository
    + DeviceRepository
    + ModuleRepository
    + SubscriptionRepository
    + DirectoryRepository
    + AuthService
{
}

impl<T> Backend for T where
    T: PlanRepository
        + OrganizationRepository
        + DeviceRepository
        + ModuleRepository
        + SubscriptionRepository
        + DirectoryRepository
        + AuthService
{
}
