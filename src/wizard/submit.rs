//! Submission plumbing: the single in-flight gate, owned pending calls and
//! the resend countdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Flow, FlowFields};
use crate::store::BackendError;

/// Identifier a successful step hands back (new organization id, module id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub label: String,
    pub value: String,
}

/// What a successful step submission produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub notice: Option<String>,
    pub receipt: Option<Receipt>,
    /// Start a resend countdown of this length
    pub countdown: Option<Duration>,
}

impl StepOutcome {
    /// Outcome of a step that needs no remote call
    pub fn local() -> Self {
        Self::default()
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            notice: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_receipt(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.receipt = Some(Receipt {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_countdown(mut self, duration: Duration) -> Self {
        self.countdown = Some(duration);
        self
    }
}

/// Allows one outstanding submission at a time.
///
/// Every acquisition is stamped with the current generation. Invalidating the
/// gate bumps the generation, so a result carrying an older stamp is stale.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    in_flight: Option<u64>,
    generation: u64,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take the gate. `None` while another submission is outstanding.
    pub fn acquire(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        self.generation += 1;
        self.in_flight = Some(self.generation);
        Some(self.generation)
    }

    /// Release the gate for `ticket`. Returns false if the ticket is stale,
    /// leaving the gate untouched.
    pub fn release(&mut self, ticket: u64) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Drop any outstanding submission; its result will be ignored
    pub fn invalidate(&mut self) {
        if self.in_flight.take().is_some() {
            tracing::debug!(generation = self.generation, "in-flight submission invalidated");
        }
        self.generation += 1;
    }
}

/// Which remote call a pending submission makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Submit,
    Resend,
}

/// A validated step submission detached from the wizard.
///
/// Owns everything it needs, so it can be moved into a spawned task while the
/// wizard keeps rendering.
pub struct PendingSubmission<F: Flow> {
    flow: Arc<F>,
    step: F::Step,
    kind: SubmissionKind,
    fields: FlowFields<F::Step>,
    ticket: u64,
}

impl<F: Flow> PendingSubmission<F> {
    pub(super) fn new(
        flow: Arc<F>,
        step: F::Step,
        kind: SubmissionKind,
        fields: FlowFields<F::Step>,
        ticket: u64,
    ) -> Self {
        Self {
            flow,
            step,
            kind,
            fields,
            ticket,
        }
    }

    pub fn step(&self) -> F::Step {
        self.step
    }

    pub fn kind(&self) -> SubmissionKind {
        self.kind
    }

    /// Perform the remote call
    pub async fn run(self) -> SubmissionResult<F::Step> {
        tracing::debug!(flow = self.flow.title(), step = ?self.step, kind = ?self.kind, "submitting step");
        let result = match self.kind {
            SubmissionKind::Submit => self.flow.submit(self.step, &self.fields).await,
            SubmissionKind::Resend => self.flow.resend(self.step, &self.fields).await,
        };
        if let Err(err) = &result {
            tracing::warn!(flow = self.flow.title(), step = ?self.step, error = %err, "step submission failed");
        }
        SubmissionResult {
            step: self.step,
            kind: self.kind,
            ticket: self.ticket,
            result,
        }
    }
}

/// Result of [`PendingSubmission::run`], handed back to the wizard
#[derive(Debug, Clone)]
pub struct SubmissionResult<S> {
    pub step: S,
    pub kind: SubmissionKind,
    pub ticket: u64,
    pub result: Result<StepOutcome, BackendError>,
}

/// Time left before a verification code may be requested again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendCountdown {
    started: Instant,
    duration: Duration,
}

impl ResendCountdown {
    pub fn start(now: Instant, duration: Duration) -> Self {
        Self {
            started: now,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.duration
            .saturating_sub(now.saturating_duration_since(self.started))
    }

    /// Remaining whole seconds, rounded up so the display never shows 0
    /// while still locked
    pub fn remaining_secs_at(&self, now: Instant) -> u64 {
        let remaining = self.remaining_at(now);
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn is_elapsed_at(&self, now: Instant) -> bool {
        self.remaining_at(now).is_zero()
    }
}
