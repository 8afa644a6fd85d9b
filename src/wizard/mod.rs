//! Multi-step wizards.
//!
//! A [`Flow`] declares the steps, the per-step schema and the remote call
//! each step makes. [`Wizard`] drives a flow: it owns the [`Stepper`], runs
//! validation before anything leaves the form and allows only one submission
//! in flight at a time.

pub mod flows;
pub mod stepper;
pub mod submit;
pub mod validate;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::BackendError;
pub use stepper::{StepFields, Stepper, WizardStep};
pub use submit::{
    PendingSubmission, Receipt, ResendCountdown, StepOutcome, SubmissionGate, SubmissionKind,
    SubmissionResult,
};
pub use validate::{FieldKind, FieldSpec, Rule, StepSchema, ValidationReport};

/// Field values of every step, as handed to a flow at submit time
pub type FlowFields<S> = BTreeMap<S, StepFields>;

/// Trimmed value of `name` on `step`, empty when absent
pub fn field_value<'a, S: WizardStep>(fields: &'a FlowFields<S>, step: S, name: &str) -> &'a str {
    fields
        .get(&step)
        .and_then(|f| f.get(name))
        .map(|v| v.trim())
        .unwrap_or("")
}

#[async_trait]
pub trait Flow: Send + Sync + 'static {
    type Step: WizardStep;

    fn title(&self) -> &'static str;

    fn schema(&self, step: Self::Step) -> StepSchema;

    /// Remote call for `step`. Local steps return [`StepOutcome::local`].
    async fn submit(
        &self,
        step: Self::Step,
        fields: &FlowFields<Self::Step>,
    ) -> Result<StepOutcome, BackendError>;

    fn supports_resend(&self, _step: Self::Step) -> bool {
        false
    }

    async fn resend(
        &self,
        step: Self::Step,
        _fields: &FlowFields<Self::Step>,
    ) -> Result<StepOutcome, BackendError> {
        Err(BackendError::Conflict(format!(
            "{} cannot be resent",
            step.label()
        )))
    }

    /// Field a backend failure belongs to, if it should render inline
    fn field_for_error(&self, _step: Self::Step, _error: &BackendError) -> Option<&'static str> {
        None
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WizardError {
    #[error("{0}")]
    Invalid(ValidationReport),

    #[error("a submission is already in progress")]
    InFlight,

    #[error("the wizard is already complete")]
    Finished,

    #[error("a new code can be requested in {remaining_secs}s")]
    ResendLocked { remaining_secs: u64 },

    #[error("this step has nothing to resend")]
    Unsupported,

    #[error("step '{0}' has not been reached yet")]
    StepLocked(&'static str),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct Wizard<F: Flow> {
    flow: Arc<F>,
    stepper: Stepper<F::Step>,
    gate: SubmissionGate,
    furthest: F::Step,
    countdown: Option<ResendCountdown>,
    receipt: Option<Receipt>,
    notice: Option<String>,
    failure: Option<BackendError>,
}

impl<F: Flow> Wizard<F> {
    pub fn new(flow: F) -> Self {
        Self::from_arc(Arc::new(flow))
    }

    pub fn from_arc(flow: Arc<F>) -> Self {
        Self {
            flow,
            stepper: Stepper::new(),
            gate: SubmissionGate::new(),
            furthest: F::Step::first(),
            countdown: None,
            receipt: None,
            notice: None,
            failure: None,
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn title(&self) -> &'static str {
        self.flow.title()
    }

    pub fn stepper(&self) -> &Stepper<F::Step> {
        &self.stepper
    }

    pub fn current(&self) -> F::Step {
        self.stepper.current()
    }

    /// Schema of the active step
    pub fn schema(&self) -> StepSchema {
        self.flow.schema(self.current())
    }

    /// Furthest step reached so far
    pub fn furthest(&self) -> F::Step {
        self.furthest
    }

    pub fn is_submitting(&self) -> bool {
        self.gate.is_in_flight()
    }

    pub fn is_finished(&self) -> bool {
        self.stepper.is_terminal()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Backend failure of the last submission, cleared on the next attempt
    pub fn failure(&self) -> Option<&BackendError> {
        self.failure.as_ref()
    }

    pub fn countdown(&self) -> Option<&ResendCountdown> {
        self.countdown.as_ref()
    }

    /// Seconds until resend unlocks; 0 when no countdown is running
    pub fn resend_remaining_secs_at(&self, now: Instant) -> u64 {
        self.countdown
            .map(|c| c.remaining_secs_at(now))
            .unwrap_or(0)
    }

    /// Store a value on the active step
    pub fn update_field(&mut self, name: &str, value: impl Into<String>) {
        let step = self.current();
        self.stepper.update_field(step, name, value);
    }

    pub fn field(&self, name: &str) -> &str {
        self.stepper.field(self.current(), name).unwrap_or("")
    }

    /// Validate the active step without submitting. Errors are shown inline.
    pub fn validate_current(&mut self) -> ValidationReport {
        let report = self.schema().validate(&self.stepper.step_fields(self.current()));
        self.stepper.set_errors(report.errors().clone());
        report
    }

    /// Validate the active step and detach its submission.
    ///
    /// Fails with `Invalid` (errors recorded for inline display), `InFlight`
    /// while an earlier submission is outstanding, or `Finished` at the
    /// terminal step.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission<F>, WizardError> {
        if self.stepper.is_terminal() {
            return Err(WizardError::Finished);
        }
        if self.gate.is_in_flight() {
            return Err(WizardError::InFlight);
        }

        let report = self.validate_current();
        if !report.is_valid() {
            tracing::debug!(step = ?self.current(), errors = report.len(), "step failed validation");
            return Err(WizardError::Invalid(report));
        }

        self.detach(SubmissionKind::Submit)
    }

    /// Request a fresh code for the active step once the countdown allows it
    pub fn begin_resend(&mut self) -> Result<PendingSubmission<F>, WizardError> {
        self.begin_resend_at(Instant::now())
    }

    pub fn begin_resend_at(&mut self, now: Instant) -> Result<PendingSubmission<F>, WizardError> {
        if !self.flow.supports_resend(self.current()) {
            return Err(WizardError::Unsupported);
        }
        if self.gate.is_in_flight() {
            return Err(WizardError::InFlight);
        }
        if let Some(countdown) = &self.countdown {
            if !countdown.is_elapsed_at(now) {
                return Err(WizardError::ResendLocked {
                    remaining_secs: countdown.remaining_secs_at(now),
                });
            }
        }
        self.detach(SubmissionKind::Resend)
    }

    fn detach(&mut self, kind: SubmissionKind) -> Result<PendingSubmission<F>, WizardError> {
        let ticket = self.gate.acquire().ok_or(WizardError::InFlight)?;
        self.failure = None;
        Ok(PendingSubmission::new(
            Arc::clone(&self.flow),
            self.current(),
            kind,
            self.stepper.all_fields().clone(),
            ticket,
        ))
    }

    /// Apply a finished submission.
    ///
    /// Returns `Ok(false)` when the result is stale and was ignored, `Ok(true)`
    /// when it was applied. A failed call stays on the step, records the
    /// failure and returns it.
    pub fn finish_submit(&mut self, result: SubmissionResult<F::Step>) -> Result<bool, WizardError> {
        self.finish_submit_at(result, Instant::now())
    }

    pub fn finish_submit_at(
        &mut self,
        result: SubmissionResult<F::Step>,
        now: Instant,
    ) -> Result<bool, WizardError> {
        if !self.gate.release(result.ticket) || result.step != self.current() {
            tracing::debug!(step = ?result.step, "ignoring stale submission result");
            return Ok(false);
        }

        let outcome = match result.result {
            Ok(outcome) => outcome,
            Err(err) => {
                if let Some(field) = self.flow.field_for_error(result.step, &err) {
                    let mut errors = BTreeMap::new();
                    errors.insert(field.to_string(), capitalize(&err.to_string()));
                    self.stepper.set_errors(errors);
                }
                self.failure = Some(err.clone());
                return Err(WizardError::Backend(err));
            }
        };

        if let Some(duration) = outcome.countdown {
            self.countdown = Some(ResendCountdown::start(now, duration));
        }
        if outcome.receipt.is_some() {
            self.receipt = outcome.receipt;
        }
        if outcome.notice.is_some() {
            self.notice = outcome.notice;
        }

        if result.kind == SubmissionKind::Submit {
            let from = self.current();
            if outcome.countdown.is_none() {
                self.countdown = None;
            }
            self.stepper.next();
            if self.current() > self.furthest {
                self.furthest = self.current();
            }
            tracing::info!(flow = self.flow.title(), from = ?from, to = ?self.current(), "wizard advanced");
        }
        Ok(true)
    }

    /// Validate, submit and apply in one go
    pub async fn submit(&mut self) -> Result<(), WizardError> {
        let pending = self.begin_submit()?;
        let result = pending.run().await;
        self.finish_submit(result).map(|_| ())
    }

    pub async fn resend(&mut self) -> Result<(), WizardError> {
        let pending = self.begin_resend()?;
        let result = pending.run().await;
        self.finish_submit(result).map(|_| ())
    }

    /// Previous step. Field values are kept; an in-flight submission is
    /// abandoned.
    pub fn back(&mut self) -> bool {
        if self.stepper.is_terminal() {
            return false;
        }
        let moved = self.stepper.back();
        if moved {
            self.gate.invalidate();
            self.failure = None;
        }
        moved
    }

    /// Jump to a step already reached. Returns whether the step changed;
    /// jumping to the current step leaves an in-flight submission alone.
    pub fn jump_to(&mut self, step: F::Step) -> Result<bool, WizardError> {
        if step > self.furthest || self.stepper.is_terminal() {
            return Err(WizardError::StepLocked(step.label()));
        }
        if step == self.current() {
            return Ok(false);
        }
        self.gate.invalidate();
        self.failure = None;
        self.stepper.go_to_step(step);
        Ok(true)
    }

    /// Start over with empty fields
    pub fn reset(&mut self) {
        self.gate.invalidate();
        self.stepper = Stepper::new();
        self.furthest = F::Step::first();
        self.countdown = None;
        self.receipt = None;
        self.notice = None;
        self.failure = None;
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
