//! Typed failures returned by the data-access layer.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("an account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("the verification code is invalid")]
    InvalidCode,

    #[error("the verification code has expired")]
    ExpiredCode,

    #[error("email or password is incorrect")]
    InvalidCredentials,

    #[error("account is {0}")]
    AccountLocked(String),

    #[error("{0}")]
    Conflict(String),

    #[error("server unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Stable snake_case identifier used in API error envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NotFound(_) => "not_found",
            BackendError::DuplicateEmail(_) => "duplicate_email",
            BackendError::InvalidCode => "invalid_code",
            BackendError::ExpiredCode => "expired_code",
            BackendError::InvalidCredentials => "invalid_credentials",
            BackendError::AccountLocked(_) => "account_locked",
            BackendError::Conflict(_) => "conflict",
            BackendError::Unavailable(_) => "server_unavailable",
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}
