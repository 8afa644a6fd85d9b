//! In-memory mock backend with simulated latency.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::BackendError;
use super::repository::{
    AuthService, BackendResult, DeviceRepository, DirectoryRepository, ModuleRepository,
    OrganizationRepository, PlanRepository, SubscriptionRepository,
};
use super::seed::{Credential, MockData};
use crate::config::Config;
use crate::types::{
    AccountStatus, Device, Module, ModuleStatus, NewAccount, NewModule, NewOrganization,
    Organization, OrganizationStatus, Permission, Plan, Role, Subscription, User,
};

/// Hex SHA-256 of a password
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Wrong guesses allowed before a reset code is discarded
pub const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
struct ResetCode {
    code: String,
    issued_at: DateTime<Utc>,
    failed_attempts: u32,
}

/// Backend that keeps everything in memory.
///
/// Every call sleeps for the configured latency first, standing in for a
/// network round trip. Tests use `latency = 0` and [`MockBackend::fail_next`]
/// to script failures.
pub struct MockBackend {
    data: RwLock<MockData>,
    reset_codes: RwLock<HashMap<String, ResetCode>>,
    latency: Duration,
    reset_code_ttl: chrono::Duration,
    injected_failure: Mutex<Option<BackendError>>,
}

impl MockBackend {
    pub fn new(data: MockData, latency: Duration) -> Self {
        Self {
            data: RwLock::new(data),
            reset_codes: RwLock::new(HashMap::new()),
            latency,
            reset_code_ttl: chrono::Duration::minutes(10),
            injected_failure: Mutex::new(None),
        }
    }

    /// Seeded backend without latency
    pub fn seeded() -> Self {
        Self::new(MockData::seeded(), Duration::ZERO)
    }

    /// Backend configured from `config`: fixtures file if set, seed data otherwise
    pub fn from_config(config: &Config) -> Result<Self> {
        let data = match config.fixtures_path() {
            Some(path) => load_fixtures(&path)?,
            None => MockData::seeded(),
        };
        let mut backend = Self::new(data, Duration::from_millis(config.backend.latency_ms));
        backend.reset_code_ttl =
            chrono::Duration::seconds(config.backend.reset_code_ttl_secs as i64);
        Ok(backend)
    }

    pub fn with_reset_code_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.reset_code_ttl = ttl;
        self
    }

    /// Make the next backend call fail with `error`
    pub fn fail_next(&self, error: BackendError) {
        if let Ok(mut slot) = self.injected_failure.lock() {
            *slot = Some(error);
        }
    }

    /// Most recent reset code issued for `email`. Codes are logged rather
    /// than delivered, so this is how tests and the CLI read them.
    pub async fn last_reset_code(&self, email: &str) -> Option<String> {
        self.reset_codes
            .read()
            .await
            .get(&normalize_email(email))
            .map(|c| c.code.clone())
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> MockData {
        self.data.read().await.clone()
    }

    async fn round_trip(&self) -> BackendResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let injected = self
            .injected_failure
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        match injected {
            Some(err) => {
                tracing::debug!(error = %err, "returning injected backend failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    async fn check_reset_code(&self, email: &str, code: &str) -> BackendResult<()> {
        let mut codes = self.reset_codes.write().await;
        let issued = codes.get_mut(email).ok_or(BackendError::InvalidCode)?;
        if issued.code != code.trim() {
            issued.failed_attempts += 1;
            if issued.failed_attempts >= MAX_CODE_ATTEMPTS {
                codes.remove(email);
                tracing::warn!(email = %email, "reset code discarded after repeated misses");
            }
            return Err(BackendError::InvalidCode);
        }
        if Utc::now() - issued.issued_at > self.reset_code_ttl {
            return Err(BackendError::ExpiredCode);
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn new_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}

fn reset_code() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{:06}", n)
}

/// Validate and append a new organization
fn insert_organization(data: &mut MockData, input: NewOrganization) -> BackendResult<Organization> {
    if !data.plans.iter().any(|p| p.id == input.plan_id) {
        return Err(BackendError::NotFound(format!("plan '{}'", input.plan_id)));
    }
    if data
        .organizations
        .iter()
        .any(|o| o.name.eq_ignore_ascii_case(input.name.trim()))
    {
        return Err(BackendError::Conflict(format!(
            "an organization named '{}' already exists",
            input.name.trim()
        )));
    }

    let organization = Organization {
        id: new_id("org"),
        name: input.name.trim().to_string(),
        industry: input.industry,
        size: input.size,
        contact: input.contact,
        address: input.address,
        plan_id: input.plan_id,
        status: OrganizationStatus::Pending,
        created_at: Utc::now(),
    };
    data.organizations.push(organization.clone());
    Ok(organization)
}

/// Validate and append an owner account with its credential
fn insert_account(data: &mut MockData, input: NewAccount) -> BackendResult<User> {
    let email = normalize_email(&input.email);
    if data.credentials.iter().any(|c| c.email == email) {
        return Err(BackendError::DuplicateEmail(email));
    }

    let user = User {
        id: new_id("usr"),
        name: input.name.trim().to_string(),
        email: email.clone(),
        role_id: "role-owner".to_string(),
        organization_id: input.organization_id.unwrap_or_default(),
        status: AccountStatus::Active,
        last_login: None,
    };
    data.credentials.push(Credential {
        user_id: user.id.clone(),
        email,
        password_hash: hash_password(&input.password),
    });
    data.users.push(user.clone());
    Ok(user)
}

/// Load a fixtures file in the `MockData` JSON shape
pub fn load_fixtures(path: &Path) -> Result<MockData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures file {}", path.display()))?;
    let data: MockData = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixtures file {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        devices = data.devices.len(),
        organizations = data.organizations.len(),
        "loaded fixtures"
    );
    Ok(data)
}

#[async_trait]
impl PlanRepository for MockBackend {
    async fn list_plans(&self) -> BackendResult<Vec<Plan>> {
        self.round_trip().await?;
        Ok(self.data.read().await.plans.clone())
    }

    async fn get_plan(&self, id: &str) -> BackendResult<Plan> {
        self.round_trip().await?;
        self.data
            .read()
            .await
            .plans
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("plan '{}'", id)))
    }
}

#[async_trait]
impl OrganizationRepository for MockBackend {
    async fn list_organizations(&self) -> BackendResult<Vec<Organization>> {
        self.round_trip().await?;
        Ok(self.data.read().await.organizations.clone())
    }

    async fn get_organization(&self, id: &str) -> BackendResult<Organization> {
        self.round_trip().await?;
        self.data
            .read()
            .await
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("organization '{}'", id)))
    }

    async fn create_organization(&self, input: NewOrganization) -> BackendResult<Organization> {
        self.round_trip().await?;
        let mut data = self.data.write().await;
        let organization = insert_organization(&mut data, input)?;
        tracing::info!(id = %organization.id, name = %organization.name, "organization created");
        Ok(organization)
    }
}

#[async_trait]
impl DeviceRepository for MockBackend {
    async fn list_devices(&self) -> BackendResult<Vec<Device>> {
        self.round_trip().await?;
        Ok(self.data.read().await.devices.clone())
    }

    async fn get_device(&self, id: &str) -> BackendResult<Device> {
        self.round_trip().await?;
        self.data
            .read()
            .await
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("device '{}'", id)))
    }
}

#[async_trait]
impl ModuleRepository for MockBackend {
    async fn list_modules(&self) -> BackendResult<Vec<Module>> {
        self.round_trip().await?;
        Ok(self.data.read().await.modules.clone())
    }

    async fn get_module(&self, id: &str) -> BackendResult<Module> {
        self.round_trip().await?;
        self.data
            .read()
            .await
            .modules
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("module '{}'", id)))
    }

    async fn submit_module(&self, input: NewModule) -> BackendResult<Module> {
        self.round_trip().await?;
        let mut data = self.data.write().await;

        if data
            .modules
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(input.name.trim()) && m.version == input.version)
        {
            return Err(BackendError::Conflict(format!(
                "module '{}' version {} was already submitted",
                input.name.trim(),
                input.version
            )));
        }

        let module = Module {
            id: new_id("mod"),
            name: input.name.trim().to_string(),
            category: input.category,
            version: input.version,
            description: input.description,
            pricing: input.pricing,
            status: ModuleStatus::PendingReview,
            publisher: input.publisher,
            downloads: 0,
            rating: 0.0,
            compatible_devices: input.compatible_devices,
        };
        data.modules.push(module.clone());
        tracing::info!(id = %module.id, name = %module.name, "module submitted for review");
        Ok(module)
    }
}

#[async_trait]
impl SubscriptionRepository for MockBackend {
    async fn list_subscriptions(&self) -> BackendResult<Vec<Subscription>> {
        self.round_trip().await?;
        Ok(self.data.read().await.subscriptions.clone())
    }
}

#[async_trait]
impl DirectoryRepository for MockBackend {
    async fn list_roles(&self) -> BackendResult<Vec<Role>> {
        self.round_trip().await?;
        Ok(self.data.read().await.roles.clone())
    }

    async fn list_permissions(&self) -> BackendResult<Vec<Permission>> {
        self.round_trip().await?;
        Ok(self.data.read().await.permissions.clone())
    }

    async fn list_users(&self) -> BackendResult<Vec<User>> {
        self.round_trip().await?;
        Ok(self.data.read().await.users.clone())
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn check_email_available(&self, email: &str) -> BackendResult<()> {
        self.round_trip().await?;
        let email = normalize_email(email);
        let data = self.data.read().await;
        if data.credentials.iter().any(|c| c.email == email) {
            return Err(BackendError::DuplicateEmail(email));
        }
        Ok(())
    }

    async fn register_account(&self, input: NewAccount) -> BackendResult<User> {
        self.round_trip().await?;
        let mut data = self.data.write().await;
        let user = insert_account(&mut data, input)?;
        tracing::info!(id = %user.id, "account registered");
        Ok(user)
    }

    async fn sign_up(
        &self,
        organization: NewOrganization,
        account: NewAccount,
    ) -> BackendResult<(Organization, User)> {
        self.round_trip().await?;
        let mut data = self.data.write().await;

        // Every check runs before the first insert so a failure writes nothing
        let email = normalize_email(&account.email);
        if data.credentials.iter().any(|c| c.email == email) {
            return Err(BackendError::DuplicateEmail(email));
        }
        let organization = insert_organization(&mut data, organization)?;
        let user = insert_account(
            &mut data,
            NewAccount {
                organization_id: Some(organization.id.clone()),
                ..account
            },
        )?;
        tracing::info!(organization = %organization.id, user = %user.id, "signed up");
        Ok((organization, user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<User> {
        self.round_trip().await?;
        let email = normalize_email(email);
        let mut data = self.data.write().await;

        let user_id = data
            .credentials
            .iter()
            .find(|c| c.email == email && c.password_hash == hash_password(password))
            .map(|c| c.user_id.clone())
            .ok_or(BackendError::InvalidCredentials)?;

        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(BackendError::InvalidCredentials)?;
        if !user.status.can_sign_in() {
            return Err(BackendError::AccountLocked(user.status.to_string()));
        }
        user.last_login = Some(Utc::now());
        Ok(user.clone())
    }

    async fn request_password_reset(&self, email: &str) -> BackendResult<()> {
        self.round_trip().await?;
        let email = normalize_email(email);
        let known = self
            .data
            .read()
            .await
            .credentials
            .iter()
            .any(|c| c.email == email);
        if !known {
            tracing::info!(email = %email, "password reset requested for unknown email");
            return Ok(());
        }

        let code = reset_code();
        // Codes are not delivered anywhere; the log stands in for the mailer.
        tracing::info!(email = %email, code = %code, "password reset code issued");
        self.reset_codes.write().await.insert(
            email,
            ResetCode {
                code,
                issued_at: Utc::now(),
                failed_attempts: 0,
            },
        );
        Ok(())
    }

    async fn verify_reset_code(&self, email: &str, code: &str) -> BackendResult<()> {
        self.round_trip().await?;
        self.check_reset_code(&normalize_email(email), code).await
    }

    async fn complete_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> BackendResult<()> {
        self.round_trip().await?;
        let email = normalize_email(email);
        self.check_reset_code(&email, code).await?;

        let mut data = self.data.write().await;
        let credential = data
            .credentials
            .iter_mut()
            .find(|c| c.email == email)
            .ok_or_else(|| BackendError::NotFound(format!("account '{}'", email)))?;
        credential.password_hash = hash_password(new_password);
        drop(data);

        self.reset_codes.write().await.remove(&email);
        tracing::info!(email = %email, "password reset completed");
        Ok(())
    }
}
