//! Route handlers for the REST API.

pub mod auth;
pub mod devices;
pub mod directory;
pub mod health;
pub mod modules;
pub mod organizations;
pub mod plans;
pub mod subscriptions;

use crate::rest::error::ApiError;
use crate::wizard::{FlowFields, StepFields, StepSchema, WizardStep};

/// Run each step schema over the matching fields of a request body.
/// All failures are reported together.
pub(crate) fn validate_steps<S: WizardStep>(
    fields: &FlowFields<S>,
    checks: Vec<(S, StepSchema)>,
) -> Result<(), ApiError> {
    let empty = StepFields::new();
    let report = checks
        .into_iter()
        .map(|(step, schema)| schema.validate(fields.get(&step).unwrap_or(&empty)))
        .reduce(|all, next| all.merge(next))
        .unwrap_or_default();

    if report.is_valid() {
        Ok(())
    } else {
        Err(ApiError::Validation(report))
    }
}

/// Parse an optional query value, treating empty strings as absent
pub(crate) fn parse_param<T, E>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, ApiError>
where
    E: std::fmt::Display,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse(v)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        None => Ok(None),
    }
}
