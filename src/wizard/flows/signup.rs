//! Account and organization signup.

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{Backend, BackendError, BackendResult};
use crate::types::{Address, Contact, NewAccount, NewOrganization, Plan};
use crate::wizard::validate::DEFAULT_PASSWORD_MIN;
use crate::wizard::{
    field_value, FieldKind, FieldSpec, Flow, FlowFields, Rule, StepOutcome, StepSchema,
    WizardStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignupStep {
    Account,
    Organization,
    Address,
    Plan,
    Review,
    Done,
}

impl WizardStep for SignupStep {
    fn sequence() -> &'static [Self] {
        &[
            SignupStep::Account,
            SignupStep::Organization,
            SignupStep::Address,
            SignupStep::Plan,
            SignupStep::Review,
            SignupStep::Done,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            SignupStep::Account => "Account",
            SignupStep::Organization => "Organization",
            SignupStep::Address => "Address",
            SignupStep::Plan => "Plan",
            SignupStep::Review => "Review",
            SignupStep::Done => "Done",
        }
    }
}

pub const INDUSTRIES: &[(&str, &str)] = &[
    ("manufacturing", "Manufacturing"),
    ("agriculture", "Agriculture"),
    ("logistics", "Logistics & cold chain"),
    ("facilities", "Facilities management"),
    ("healthcare", "Healthcare"),
    ("energy", "Energy & utilities"),
    ("other", "Other"),
];

pub const COMPANY_SIZES: &[(&str, &str)] = &[
    ("1-10", "1-10 employees"),
    ("11-50", "11-50 employees"),
    ("51-200", "51-200 employees"),
    ("201-1000", "201-1000 employees"),
    ("1000+", "More than 1000 employees"),
];

fn options(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(value, label)| (value.to_string(), label.to_string()))
        .collect()
}

pub struct SignupFlow {
    backend: Arc<dyn Backend>,
    plans: Vec<Plan>,
    password_min: usize,
}

impl SignupFlow {
    pub fn new(backend: Arc<dyn Backend>, plans: Vec<Plan>) -> Self {
        Self {
            backend,
            plans,
            password_min: DEFAULT_PASSWORD_MIN,
        }
    }

    /// Build the flow with the plan list fetched from `backend`
    pub async fn load(backend: Arc<dyn Backend>) -> BackendResult<Self> {
        let plans = backend.list_plans().await?;
        Ok(Self::new(backend, plans))
    }

    pub fn with_password_min(mut self, min: usize) -> Self {
        self.password_min = min;
        self
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    fn plan_options(&self) -> Vec<(String, String)> {
        self.plans
            .iter()
            .map(|p| {
                let price = if p.price > 0.0 {
                    format!("${:.0}/mo", p.price)
                } else {
                    "free".to_string()
                };
                (p.id.clone(), format!("{} ({})", p.name, price))
            })
            .collect()
    }

    async fn create(&self, fields: &FlowFields<SignupStep>) -> Result<StepOutcome, BackendError> {
        let input = organization_from_fields(fields);
        let email = field_value(fields, SignupStep::Account, "email");

        let account = NewAccount {
            name: field_value(fields, SignupStep::Account, "full_name").to_string(),
            email: email.to_string(),
            password: fields
                .get(&SignupStep::Account)
                .and_then(|f| f.get("password"))
                .cloned()
                .unwrap_or_default(),
            organization_id: None,
        };
        // Organization and owner account are stored together or not at all
        let (organization, user) = self.backend.sign_up(input, account).await?;
        tracing::info!(organization = %organization.id, user = %user.id, "signup completed");

        Ok(StepOutcome::notice(format!(
            "Welcome aboard, {}! {} is pending activation",
            user.name, organization.name
        ))
        .with_receipt("Organization ID", organization.id))
    }
}

/// Organization input from the organization, address and plan steps
pub fn organization_from_fields(fields: &FlowFields<SignupStep>) -> NewOrganization {
    let org = |name: &str| field_value(fields, SignupStep::Organization, name).to_string();
    let addr = |name: &str| field_value(fields, SignupStep::Address, name).to_string();
    let website = org("website");

    NewOrganization {
        name: org("name"),
        industry: org("industry"),
        size: org("size"),
        contact: Contact {
            email: field_value(fields, SignupStep::Account, "email").to_ascii_lowercase(),
            phone: org("phone"),
            website: (!website.is_empty()).then_some(website),
        },
        address: Address {
            street: addr("street"),
            city: addr("city"),
            region: addr("region"),
            postal_code: addr("postal_code"),
            country: addr("country"),
        },
        plan_id: field_value(fields, SignupStep::Plan, "plan_id").to_string(),
    }
}

/// Schemas for the organization-profile steps, shared with the REST API
pub fn organization_schema() -> StepSchema {
    StepSchema::new(vec![
        FieldSpec::new("name", "Organization name")
            .rule(Rule::Required)
            .rule(Rule::MinLength(2))
            .rule(Rule::MaxLength(80)),
        FieldSpec::new("industry", "Industry")
            .rule(Rule::Required)
            .choice(options(INDUSTRIES)),
        FieldSpec::new("size", "Company size")
            .rule(Rule::Required)
            .choice(options(COMPANY_SIZES)),
        FieldSpec::new("phone", "Phone")
            .rule(Rule::Required)
            .rule(Rule::Phone)
            .placeholder("+1 555 010 2000"),
        FieldSpec::new("website", "Website")
            .rule(Rule::Url)
            .placeholder("https://"),
    ])
}

pub fn address_schema() -> StepSchema {
    StepSchema::new(vec![
        FieldSpec::new("street", "Street").rule(Rule::Required),
        FieldSpec::new("city", "City").rule(Rule::Required),
        FieldSpec::new("region", "State / region").rule(Rule::Required),
        FieldSpec::new("postal_code", "Postal code")
            .rule(Rule::Required)
            .rule(Rule::MaxLength(12)),
        FieldSpec::new("country", "Country")
            .rule(Rule::Required)
            .rule(Rule::MinLength(2)),
    ])
}

#[async_trait]
impl Flow for SignupFlow {
    type Step = SignupStep;

    fn title(&self) -> &'static str {
        "Create your organization"
    }

    fn schema(&self, step: SignupStep) -> StepSchema {
        match step {
            SignupStep::Account => StepSchema::new(vec![
                FieldSpec::new("full_name", "Full name")
                    .rule(Rule::Required)
                    .rule(Rule::MinLength(2)),
                FieldSpec::new("email", "Work email")
                    .rule(Rule::Required)
                    .rule(Rule::Email),
                FieldSpec::new("password", "Password")
                    .kind(FieldKind::Secret)
                    .rule(Rule::Required)
                    .rule(Rule::PasswordStrength(self.password_min)),
                FieldSpec::new("confirm_password", "Confirm password")
                    .kind(FieldKind::Secret)
                    .rule(Rule::Required)
                    .rule(Rule::Matches("password")),
            ]),
            SignupStep::Organization => organization_schema(),
            SignupStep::Address => address_schema(),
            SignupStep::Plan => StepSchema::new(vec![FieldSpec::new("plan_id", "Plan")
                .rule(Rule::Required)
                .choice(self.plan_options())]),
            SignupStep::Review | SignupStep::Done => StepSchema::empty(),
        }
    }

    async fn submit(
        &self,
        step: SignupStep,
        fields: &FlowFields<SignupStep>,
    ) -> Result<StepOutcome, BackendError> {
        match step {
            SignupStep::Account => {
                let email = field_value(fields, SignupStep::Account, "email");
                self.backend.check_email_available(email).await?;
                Ok(StepOutcome::local())
            }
            SignupStep::Plan => {
                let plan = self
                    .backend
                    .get_plan(field_value(fields, SignupStep::Plan, "plan_id"))
                    .await?;
                Ok(StepOutcome::notice(format!("{} plan selected", plan.name)))
            }
            SignupStep::Review => self.create(fields).await,
            SignupStep::Organization | SignupStep::Address | SignupStep::Done => {
                Ok(StepOutcome::local())
            }
        }
    }

    fn field_for_error(&self, step: SignupStep, error: &BackendError) -> Option<&'static str> {
        match (step, error) {
            (SignupStep::Account, BackendError::DuplicateEmail(_)) => Some("email"),
            (SignupStep::Plan, BackendError::NotFound(_)) => Some("plan_id"),
            _ => None,
        }
    }
}
