//! Sign-in and password recovery endpoints.
//!
//! Inputs are checked with the password reset wizard's step schemas before
//! they reach the backend.

use axum::{extract::State, Json};

use crate::rest::dto::{
    CompletePasswordResetRequest, MessageResponse, PasswordResetRequest, SignInRequest,
    VerifyCodeRequest,
};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::routes::validate_steps;
use crate::rest::state::ApiState;
use crate::types::User;
use crate::wizard::flows::reset_password::{ResetPasswordFlow, ResetStep};
use crate::wizard::{Flow, FlowFields, StepFields};

fn reset_fields(pairs: &[(ResetStep, &str, &str)]) -> FlowFields<ResetStep> {
    let mut fields = FlowFields::new();
    for (step, name, value) in pairs {
        fields
            .entry(*step)
            .or_insert_with(StepFields::new)
            .insert(name.to_string(), value.to_string());
    }
    fields
}

fn check_reset_steps(
    state: &ApiState,
    fields: &FlowFields<ResetStep>,
    steps: &[ResetStep],
) -> Result<(), ApiError> {
    let flow = ResetPasswordFlow::from_config(state.backend.clone(), &state.config);
    validate_steps(
        fields,
        steps.iter().map(|step| (*step, flow.schema(*step))).collect(),
    )
}

/// Request a password reset code
///
/// Always succeeds for well-formed addresses so the response does not reveal
/// which emails are registered.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    tag = "Auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Code sent if the address is registered", body = MessageResponse),
        (status = 400, description = "Malformed email", body = ErrorResponse)
    )
)]
pub async fn request_reset(
    State(state): State<ApiState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let fields = reset_fields(&[(ResetStep::Email, "email", request.email.as_str())]);
    check_reset_steps(&state, &fields, &[ResetStep::Email])?;

    state
        .backend
        .request_password_reset(request.email.trim())
        .await?;
    Ok(Json(MessageResponse::new(format!(
        "If {} is registered, a verification code is on its way",
        request.email.trim()
    ))))
}

/// Check a reset code without consuming it
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/verify",
    tag = "Auth",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code is valid", body = MessageResponse),
        (status = 400, description = "Malformed input, or invalid or expired code", body = ErrorResponse)
    )
)]
pub async fn verify_code(
    State(state): State<ApiState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let fields = reset_fields(&[
        (ResetStep::Email, "email", request.email.as_str()),
        (ResetStep::Code, "code", request.code.as_str()),
    ]);
    check_reset_steps(&state, &fields, &[ResetStep::Email, ResetStep::Code])?;

    state
        .backend
        .verify_reset_code(request.email.trim(), request.code.trim())
        .await?;
    Ok(Json(MessageResponse::new("Verification code accepted")))
}

/// Set a new password with a valid reset code
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/complete",
    tag = "Auth",
    request_body = CompletePasswordResetRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Weak password, or invalid or expired code", body = ErrorResponse)
    )
)]
pub async fn complete_reset(
    State(state): State<ApiState>,
    Json(request): Json<CompletePasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let fields = reset_fields(&[
        (ResetStep::Email, "email", request.email.as_str()),
        (ResetStep::Code, "code", request.code.as_str()),
        (ResetStep::NewPassword, "password", request.password.as_str()),
        (ResetStep::NewPassword, "confirm_password", request.password.as_str()),
    ]);
    check_reset_steps(
        &state,
        &fields,
        &[ResetStep::Email, ResetStep::Code, ResetStep::NewPassword],
    )?;

    state
        .backend
        .complete_password_reset(request.email.trim(), request.code.trim(), &request.password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = User),
        (status = 401, description = "Wrong email or password", body = ErrorResponse),
        (status = 403, description = "Account locked or disabled", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<ApiState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .backend
        .sign_in(request.email.trim(), &request.password)
        .await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::store::seed::DEMO_PASSWORD;
    use crate::store::{BackendError, MockBackend};

    fn state() -> (Arc<MockBackend>, ApiState) {
        let backend = Arc::new(MockBackend::seeded());
        let state = ApiState::new(Config::default(), backend.clone());
        (backend, state)
    }

    #[tokio::test]
    async fn test_reset_then_sign_in_with_new_password() {
        let (backend, state) = state();
        let email = "user@example.com".to_string();

        request_reset(
            State(state.clone()),
            Json(PasswordResetRequest {
                email: email.clone(),
            }),
        )
        .await
        .unwrap();
        let code = backend.last_reset_code(&email).await.unwrap();

        verify_code(
            State(state.clone()),
            Json(VerifyCodeRequest {
                email: email.clone(),
                code: code.clone(),
            }),
        )
        .await
        .unwrap();
        complete_reset(
            State(state.clone()),
            Json(CompletePasswordResetRequest {
                email: email.clone(),
                code,
                password: "Fresh#Start9".to_string(),
            }),
        )
        .await
        .unwrap();

        let user = sign_in(
            State(state.clone()),
            Json(SignInRequest {
                email: email.clone(),
                password: "Fresh#Start9".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(user.email, email);

        let old = sign_in(
            State(state),
            Json(SignInRequest {
                email,
                password: DEMO_PASSWORD.to_string(),
            }),
        )
        .await;
        assert!(matches!(
            old,
            Err(ApiError::Backend(BackendError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_request_reset_rejects_malformed_email() {
        let (_, state) = state();
        let result = request_reset(
            State(state),
            Json(PasswordResetRequest {
                email: "not-an-email".to_string(),
            }),
        )
        .await;
        match result {
            Err(ApiError::Validation(report)) => assert_eq!(report.len(), 1),
            other => panic!("expected validation error, got {:?}", other.map(|r| r.0.message)),
        }
    }

    #[tokio::test]
    async fn test_complete_reset_rejects_weak_password() {
        let (_, state) = state();
        let result = complete_reset(
            State(state),
            Json(CompletePasswordResetRequest {
                email: "user@example.com".to_string(),
                code: "123456".to_string(),
                password: "short".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_in_locked_account() {
        let (_, state) = state();
        let result = sign_in(
            State(state),
            Json(SignInRequest {
                email: "anouk@greenleaf.example".to_string(),
                password: DEMO_PASSWORD.to_string(),
            }),
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Backend(BackendError::AccountLocked(_)))
        ));
    }
}
