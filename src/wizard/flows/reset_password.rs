//! Forgotten-password recovery: email, verification code, new password.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::store::{Backend, BackendError};
use crate::wizard::{
    field_value, FieldKind, FieldSpec, Flow, FlowFields, Rule, StepOutcome, StepSchema,
    WizardStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResetStep {
    Email,
    Code,
    NewPassword,
    Done,
}

impl WizardStep for ResetStep {
    fn sequence() -> &'static [Self] {
        &[
            ResetStep::Email,
            ResetStep::Code,
            ResetStep::NewPassword,
            ResetStep::Done,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            ResetStep::Email => "Email",
            ResetStep::Code => "Verify",
            ResetStep::NewPassword => "New password",
            ResetStep::Done => "Done",
        }
    }
}

pub struct ResetPasswordFlow {
    backend: Arc<dyn Backend>,
    resend_cooldown: Duration,
    password_min: usize,
}

impl ResetPasswordFlow {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            resend_cooldown: Duration::from_secs(60),
            password_min: crate::wizard::validate::DEFAULT_PASSWORD_MIN,
        }
    }

    pub fn from_config(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self {
            backend,
            resend_cooldown: config.resend_cooldown(),
            password_min: config.wizard.password_min_length,
        }
    }

    pub fn with_resend_cooldown(mut self, cooldown: Duration) -> Self {
        self.resend_cooldown = cooldown;
        self
    }

    async fn send_code(&self, fields: &FlowFields<ResetStep>) -> Result<StepOutcome, BackendError> {
        let email = field_value(fields, ResetStep::Email, "email");
        self.backend.request_password_reset(email).await?;
        Ok(StepOutcome::notice(format!(
            "If {} is registered, a verification code is on its way",
            email
        ))
        .with_countdown(self.resend_cooldown))
    }
}

#[async_trait]
impl Flow for ResetPasswordFlow {
    type Step = ResetStep;

    fn title(&self) -> &'static str {
        "Reset password"
    }

    fn schema(&self, step: ResetStep) -> StepSchema {
        match step {
            ResetStep::Email => StepSchema::new(vec![FieldSpec::new("email", "Email")
                .rule(Rule::Required)
                .rule(Rule::Email)
                .placeholder("you@company.com")]),
            ResetStep::Code => StepSchema::new(vec![FieldSpec::new("code", "Verification code")
                .rule(Rule::Required)
                .rule(Rule::Digits(6))
                .placeholder("6-digit code")]),
            ResetStep::NewPassword => StepSchema::new(vec![
                FieldSpec::new("password", "New password")
                    .kind(FieldKind::Secret)
                    .rule(Rule::Required)
                    .rule(Rule::PasswordStrength(self.password_min)),
                FieldSpec::new("confirm_password", "Confirm password")
                    .kind(FieldKind::Secret)
                    .rule(Rule::Required)
                    .rule(Rule::Matches("password")),
            ]),
            ResetStep::Done => StepSchema::empty(),
        }
    }

    async fn submit(
        &self,
        step: ResetStep,
        fields: &FlowFields<ResetStep>,
    ) -> Result<StepOutcome, BackendError> {
        let email = field_value(fields, ResetStep::Email, "email");
        let code = field_value(fields, ResetStep::Code, "code");
        match step {
            ResetStep::Email => self.send_code(fields).await,
            ResetStep::Code => {
                self.backend.verify_reset_code(email, code).await?;
                Ok(StepOutcome::local())
            }
            ResetStep::NewPassword => {
                // Passwords are not trimmed
                let password = fields
                    .get(&ResetStep::NewPassword)
                    .and_then(|f| f.get("password"))
                    .map(String::as_str)
                    .unwrap_or("");
                self.backend
                    .complete_password_reset(email, code, password)
                    .await?;
                Ok(StepOutcome::notice(
                    "Password updated. You can now sign in with your new password",
                ))
            }
            ResetStep::Done => Ok(StepOutcome::local()),
        }
    }

    fn supports_resend(&self, step: ResetStep) -> bool {
        step == ResetStep::Code
    }

    async fn resend(
        &self,
        _step: ResetStep,
        fields: &FlowFields<ResetStep>,
    ) -> Result<StepOutcome, BackendError> {
        self.send_code(fields).await
    }

    fn field_for_error(&self, step: ResetStep, error: &BackendError) -> Option<&'static str> {
        match (step, error) {
            (ResetStep::Code, BackendError::InvalidCode | BackendError::ExpiredCode) => {
                Some("code")
            }
            _ => None,
        }
    }
}
