//! Tests for wizard navigation, submission and the built-in flows

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::flows::{
    ModuleUploadFlow, ResetPasswordFlow, ResetStep, SignupFlow, SignupStep, UploadStep,
};
use super::{Flow, Wizard, WizardError};
use crate::store::seed::DEMO_PASSWORD;
use crate::store::{
    AuthService, Backend, BackendError, ModuleRepository, MockBackend, OrganizationRepository,
};
use crate::types::{ModuleStatus, NewAccount, OrganizationStatus};

fn backend() -> (Arc<MockBackend>, Arc<dyn Backend>) {
    let mock = Arc::new(MockBackend::seeded());
    let shared: Arc<dyn Backend> = mock.clone();
    (mock, shared)
}

fn reset_wizard() -> (Arc<MockBackend>, Wizard<ResetPasswordFlow>) {
    let (mock, shared) = backend();
    (mock, Wizard::new(ResetPasswordFlow::new(shared)))
}

async fn signup_wizard() -> (Arc<MockBackend>, Wizard<SignupFlow>) {
    let (mock, shared) = backend();
    let flow = SignupFlow::load(shared).await.unwrap();
    (mock, Wizard::new(flow))
}

fn fill<F: Flow>(wizard: &mut Wizard<F>, values: &[(&str, &str)]) {
    for (name, value) in values {
        wizard.update_field(name, *value);
    }
}

// ─── Password reset ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reset_rejects_malformed_email() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "not-an-email");

    let err = wizard.submit().await.unwrap_err();
    match err {
        WizardError::Invalid(report) => {
            assert_eq!(report.len(), 1);
            assert_eq!(
                report.error("email"),
                Some("Email must be a valid email address")
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(wizard.current(), ResetStep::Email);
    assert_eq!(wizard.stepper().errors().len(), 1);
    assert!(wizard.countdown().is_none());
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_reset_valid_email_advances_and_starts_countdown() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");

    let pending = wizard.begin_submit().unwrap();
    assert!(wizard.is_submitting());
    let result = pending.run().await;

    let now = Instant::now();
    assert!(wizard.finish_submit_at(result, now).unwrap());
    assert_eq!(wizard.current(), ResetStep::Code);
    assert!(wizard.stepper().errors().is_empty());
    assert_eq!(wizard.resend_remaining_secs_at(now), 60);
    assert_eq!(
        wizard.countdown().unwrap().duration(),
        Duration::from_secs(60)
    );
}

#[tokio::test]
async fn test_resend_locked_until_countdown_elapses() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    let result = wizard.begin_submit().unwrap().run().await;
    let start = Instant::now();
    wizard.finish_submit_at(result, start).unwrap();

    let err = wizard
        .begin_resend_at(start + Duration::from_secs(45))
        .err()
        .unwrap();
    assert_eq!(err, WizardError::ResendLocked { remaining_secs: 15 });

    let later = start + Duration::from_secs(61);
    let result = wizard.begin_resend_at(later).unwrap().run().await;
    assert!(wizard.finish_submit_at(result, later).unwrap());
    // Resend restarts the countdown without moving
    assert_eq!(wizard.current(), ResetStep::Code);
    assert_eq!(wizard.resend_remaining_secs_at(later), 60);
}

#[tokio::test]
async fn test_resend_unsupported_on_email_step() {
    let (_, mut wizard) = reset_wizard();
    assert_eq!(
        wizard.begin_resend().err().unwrap(),
        WizardError::Unsupported
    );
}

#[tokio::test]
async fn test_reset_wrong_code_is_shown_on_field() {
    let (mock, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    wizard.submit().await.unwrap();

    let code = mock.last_reset_code("user@example.com").await.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    wizard.update_field("code", wrong);

    let err = wizard.submit().await.unwrap_err();
    assert_eq!(err, WizardError::Backend(BackendError::InvalidCode));
    assert_eq!(wizard.current(), ResetStep::Code);
    assert_eq!(
        wizard.stepper().error("code"),
        Some("The verification code is invalid")
    );
    assert_eq!(wizard.failure(), Some(&BackendError::InvalidCode));
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_reset_full_flow_changes_password() {
    let (mock, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    wizard.submit().await.unwrap();

    let code = mock.last_reset_code("user@example.com").await.unwrap();
    wizard.update_field("code", code);
    wizard.submit().await.unwrap();
    assert_eq!(wizard.current(), ResetStep::NewPassword);

    fill(
        &mut wizard,
        &[("password", "Fresh#Start9"), ("confirm_password", "Fresh#Start9")],
    );
    wizard.submit().await.unwrap();
    assert!(wizard.is_finished());
    assert!(wizard.notice().unwrap().contains("Password updated"));

    assert!(mock.sign_in("user@example.com", "Fresh#Start9").await.is_ok());
    assert_eq!(
        mock.sign_in("user@example.com", DEMO_PASSWORD).await,
        Err(BackendError::InvalidCredentials)
    );
    assert_eq!(wizard.submit().await, Err(WizardError::Finished));
}

#[test]
fn test_password_confirmation_must_match() {
    let (_, wizard) = reset_wizard();
    let schema = wizard.flow().schema(ResetStep::NewPassword);

    let mut values = super::StepFields::new();
    values.insert("password".into(), "Fresh#Start9".into());
    values.insert("confirm_password".into(), "Fresh#Start8".into());
    let report = schema.validate(&values);
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.error("confirm_password"),
        Some("Confirm password must match New password")
    );
}

// ─── Submission gate ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_double_submission_is_rejected() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");

    let pending = wizard.begin_submit().unwrap();
    assert_eq!(wizard.begin_submit().err().unwrap(), WizardError::InFlight);

    let result = pending.run().await;
    assert!(wizard.finish_submit(result).unwrap());
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_result_after_back_is_ignored() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    wizard.submit().await.unwrap();

    wizard.update_field("code", "123456");
    let pending = wizard.begin_submit().unwrap();
    assert!(wizard.back());
    assert!(!wizard.is_submitting());

    let result = pending.run().await;
    assert!(!wizard.finish_submit(result).unwrap());
    assert_eq!(wizard.current(), ResetStep::Email);
}

#[tokio::test]
async fn test_result_after_reset_is_ignored() {
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    let pending = wizard.begin_submit().unwrap();
    wizard.reset();

    let result = pending.run().await;
    assert!(!wizard.finish_submit(result).unwrap());
    assert_eq!(wizard.current(), ResetStep::Email);
    assert_eq!(wizard.field("email"), "");
    assert!(wizard.countdown().is_none());
}

#[tokio::test]
async fn test_backend_outage_keeps_step_for_retry() {
    let (mock, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    mock.fail_next(BackendError::Unavailable("maintenance".to_string()));

    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Backend(BackendError::Unavailable(_))
    ));
    assert_eq!(wizard.current(), ResetStep::Email);
    assert!(wizard.failure().is_some());

    // Manual retry succeeds and clears the failure
    wizard.submit().await.unwrap();
    assert_eq!(wizard.current(), ResetStep::Code);
    assert!(wizard.failure().is_none());
}

#[test]
fn test_pending_submission_is_send() {
    fn assert_send<T: Send>(_: &T) {}
    let (_, mut wizard) = reset_wizard();
    wizard.update_field("email", "user@example.com");
    let pending = wizard.begin_submit().unwrap();
    let future = pending.run();
    assert_send(&future);
}

// ─── Navigation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_back_restores_field_values() {
    let (_, mut wizard) = signup_wizard().await;
    fill(
        &mut wizard,
        &[
            ("full_name", "Ada Byron"),
            ("email", "ada@analytical.example"),
            ("password", "Engine#1843"),
            ("confirm_password", "Engine#1843"),
        ],
    );
    let before = wizard.stepper().step_fields(SignupStep::Account);

    wizard.submit().await.unwrap();
    assert_eq!(wizard.current(), SignupStep::Organization);
    assert!(wizard.back());
    assert_eq!(wizard.current(), SignupStep::Account);
    assert_eq!(wizard.stepper().step_fields(SignupStep::Account), before);
}

#[tokio::test]
async fn test_jump_limited_to_reached_steps() {
    let (_, mut wizard) = signup_wizard().await;
    assert_eq!(
        wizard.jump_to(SignupStep::Plan),
        Err(WizardError::StepLocked("Plan"))
    );

    fill(
        &mut wizard,
        &[
            ("full_name", "Ada Byron"),
            ("email", "ada@analytical.example"),
            ("password", "Engine#1843"),
            ("confirm_password", "Engine#1843"),
        ],
    );
    wizard.submit().await.unwrap();
    assert!(wizard.back());
    assert_eq!(wizard.furthest(), SignupStep::Organization);
    assert_eq!(wizard.jump_to(SignupStep::Organization), Ok(true));
    assert_eq!(wizard.jump_to(SignupStep::Organization), Ok(false));
    assert_eq!(wizard.current(), SignupStep::Organization);
    assert!(wizard.jump_to(SignupStep::Address).is_err());
}

// ─── Signup ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_signup_duplicate_email() {
    let (_, mut wizard) = signup_wizard().await;
    fill(
        &mut wizard,
        &[
            ("full_name", "Demo Again"),
            ("email", "user@example.com"),
            ("password", "Engine#1843"),
            ("confirm_password", "Engine#1843"),
        ],
    );

    let err = wizard.submit().await.unwrap_err();
    assert_eq!(
        err,
        WizardError::Backend(BackendError::DuplicateEmail(
            "user@example.com".to_string()
        ))
    );
    assert_eq!(wizard.current(), SignupStep::Account);
    assert!(wizard.stepper().error("email").is_some());
}

#[tokio::test]
async fn test_signup_creates_organization() {
    let (mock, mut wizard) = signup_wizard().await;
    fill(
        &mut wizard,
        &[
            ("full_name", "Ada Byron"),
            ("email", "ada@analytical.example"),
            ("password", "Engine#1843"),
            ("confirm_password", "Engine#1843"),
        ],
    );
    wizard.submit().await.unwrap();

    fill(
        &mut wizard,
        &[
            ("name", "Analytical Engines"),
            ("industry", "manufacturing"),
            ("size", "11-50"),
            ("phone", "+44 20 7946 0000"),
        ],
    );
    wizard.submit().await.unwrap();

    fill(
        &mut wizard,
        &[
            ("street", "12 Marylebone Rd"),
            ("city", "London"),
            ("region", "Greater London"),
            ("postal_code", "NW1 5LR"),
            ("country", "GB"),
        ],
    );
    wizard.submit().await.unwrap();

    wizard.update_field("plan_id", "plan-gold");
    assert!(matches!(
        wizard.submit().await,
        Err(WizardError::Invalid(_))
    ));
    wizard.update_field("plan_id", "plan-pro");
    wizard.submit().await.unwrap();
    assert_eq!(wizard.current(), SignupStep::Review);

    wizard.submit().await.unwrap();
    assert!(wizard.is_finished());

    let receipt = wizard.receipt().unwrap();
    assert_eq!(receipt.label, "Organization ID");
    let org = mock.get_organization(&receipt.value).await.unwrap();
    assert_eq!(org.name, "Analytical Engines");
    assert_eq!(org.status, OrganizationStatus::Pending);
    assert_eq!(org.plan_id, "plan-pro");
    assert_eq!(org.contact.website, None);

    let user = mock
        .sign_in("ada@analytical.example", "Engine#1843")
        .await
        .unwrap();
    assert_eq!(user.organization_id, org.id);
}

/// Walk a fresh signup wizard up to the review step
async fn signup_to_review(wizard: &mut Wizard<SignupFlow>, email: &str) {
    fill(
        wizard,
        &[
            ("full_name", "Grace Hopper"),
            ("email", email),
            ("password", "Compiler#1952"),
            ("confirm_password", "Compiler#1952"),
        ],
    );
    wizard.submit().await.unwrap();
    fill(
        wizard,
        &[
            ("name", "Harbor Freight Cooling"),
            ("industry", "logistics"),
            ("size", "51-200"),
            ("phone", "+1 555 010 4242"),
        ],
    );
    wizard.submit().await.unwrap();
    fill(
        wizard,
        &[
            ("street", "7 Pier Rd"),
            ("city", "Baltimore"),
            ("region", "MD"),
            ("postal_code", "21202"),
            ("country", "US"),
        ],
    );
    wizard.submit().await.unwrap();
    wizard.update_field("plan_id", "plan-starter");
    wizard.submit().await.unwrap();
    assert_eq!(wizard.current(), SignupStep::Review);
}

#[tokio::test]
async fn test_signup_email_taken_before_review_creates_nothing() {
    let (mock, mut wizard) = signup_wizard().await;
    signup_to_review(&mut wizard, "grace@harbor.example").await;
    let before = mock.list_organizations().await.unwrap().len();

    // Someone else registers the address while the user is on the review step
    mock.register_account(NewAccount {
        name: "Other Grace".to_string(),
        email: "grace@harbor.example".to_string(),
        password: "Other#Pass77".to_string(),
        organization_id: None,
    })
    .await
    .unwrap();

    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Backend(BackendError::DuplicateEmail(_))
    ));
    assert_eq!(wizard.current(), SignupStep::Review);
    assert_eq!(mock.list_organizations().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_signup_retry_after_outage_succeeds() {
    let (mock, mut wizard) = signup_wizard().await;
    signup_to_review(&mut wizard, "grace@harbor.example").await;
    let before = mock.list_organizations().await.unwrap().len();

    mock.fail_next(BackendError::Unavailable("maintenance".to_string()));
    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Backend(BackendError::Unavailable(_))
    ));
    assert_eq!(mock.list_organizations().await.unwrap().len(), before);

    wizard.submit().await.unwrap();
    assert!(wizard.is_finished());
    let orgs = mock.list_organizations().await.unwrap();
    assert_eq!(orgs.len(), before + 1);
    let user = mock
        .sign_in("grace@harbor.example", "Compiler#1952")
        .await
        .unwrap();
    assert!(orgs.iter().any(|o| o.id == user.organization_id));
}

// ─── Module upload ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_module_upload_flow() {
    let (mock, shared) = backend();
    let mut wizard = Wizard::new(ModuleUploadFlow::new(shared, "Acme Cold Chain"));

    fill(
        &mut wizard,
        &[
            ("name", "Door Ajar Alerts"),
            ("category", "alerts"),
            ("description", "Pages the on-call tech when a cooler door stays open"),
        ],
    );
    wizard.submit().await.unwrap();

    fill(
        &mut wizard,
        &[
            ("version", "1.0"),
            ("package_url", "https://pkg.example.com/door-ajar-1.0.0.zip"),
            ("devices", "motion, temperature"),
        ],
    );
    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(err, WizardError::Invalid(ref r) if r.error("version").is_some()));
    wizard.update_field("version", "1.0.0");
    wizard.submit().await.unwrap();

    fill(&mut wizard, &[("model", "one_time"), ("price", "0")]);
    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(err, WizardError::Backend(BackendError::Conflict(_))));
    assert!(wizard.stepper().error("price").is_some());
    assert_eq!(wizard.current(), UploadStep::Pricing);

    wizard.update_field("price", "19.99");
    wizard.submit().await.unwrap();
    wizard.submit().await.unwrap();
    assert!(wizard.is_finished());

    let id = wizard.receipt().unwrap().value.clone();
    let module = mock.get_module(&id).await.unwrap();
    assert_eq!(module.status, ModuleStatus::PendingReview);
    assert_eq!(module.publisher, "Acme Cold Chain");
    assert_eq!(module.compatible_devices.len(), 2);
}
