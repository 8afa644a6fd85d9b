//! API error types and responses.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::BackendError;
use crate::types::StatusParseError;
use crate::wizard::ValidationReport;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Field validation failed
    Validation(ValidationReport),
    /// Malformed query or body
    BadRequest(String),
    /// Typed failure from the backend
    Backend(BackendError),
    InternalError(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Field name to message, for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

/// Field names in bodies are camelCase; schema fields are snake_case
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::DuplicateEmail(_) | BackendError::Conflict(_) => StatusCode::CONFLICT,
        BackendError::InvalidCode | BackendError::ExpiredCode => StatusCode::BAD_REQUEST,
        BackendError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        BackendError::AccountLocked(_) => StatusCode::FORBIDDEN,
        BackendError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(report) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation_error".to_string(),
                    message: report.to_string(),
                    fields: Some(
                        report
                            .into_errors()
                            .into_iter()
                            .map(|(name, message)| (camel_case(&name), message))
                            .collect(),
                    ),
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "bad_request".to_string(),
                    message: msg,
                    fields: None,
                },
            ),
            ApiError::Backend(err) => (
                backend_status(&err),
                ErrorResponse {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                    fields: None,
                },
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "internal API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal_error".to_string(),
                        message: msg,
                        fields: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

impl From<StatusParseError> for ApiError {
    fn from(err: StatusParseError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{FieldSpec, Rule, StepSchema};
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> ErrorResponse {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let error = ApiError::from(BackendError::NotFound("device 'dev-999'".to_string()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_of(response).await;
        assert_eq!(json.error, "not_found");
        assert_eq!(json.message, "device 'dev-999' not found");
        assert!(json.fields.is_none());
    }

    #[tokio::test]
    async fn test_validation_response_lists_fields() {
        let schema = StepSchema::new(vec![FieldSpec::new("email", "Email")
            .rule(Rule::Required)
            .rule(Rule::Email)]);
        let mut values = crate::wizard::StepFields::new();
        values.insert("email".to_string(), "nope".to_string());
        let response = ApiError::Validation(schema.validate(&values)).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_of(response).await;
        assert_eq!(json.error, "validation_error");
        assert_eq!(
            json.fields.unwrap().get("email").map(String::as_str),
            Some("Email must be a valid email address")
        );
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("postal_code"), "postalCode");
        assert_eq!(camel_case("email"), "email");
        assert_eq!(camel_case("package_url"), "packageUrl");
    }

    #[test]
    fn test_backend_status_mapping() {
        let cases = [
            (BackendError::DuplicateEmail("a@b.co".into()), StatusCode::CONFLICT),
            (BackendError::InvalidCode, StatusCode::BAD_REQUEST),
            (BackendError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (BackendError::AccountLocked("locked".into()), StatusCode::FORBIDDEN),
            (
                BackendError::Unavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
