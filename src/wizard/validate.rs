//! Per-step field validation.
//!
//! A [`StepSchema`] describes the inputs of one wizard step. Validation is a
//! pure function of the schema and the entered values.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::stepper::StepFields;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)*\.[A-Za-z]{2,}$").unwrap());
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+(:\d+)?(/\S*)?$").unwrap());
static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").unwrap());

/// Minimum password length used when a flow does not override it
pub const DEFAULT_PASSWORD_MIN: usize = 8;

/// How the renderer should present an input
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// Masked text (passwords)
    Secret,
    /// One of a fixed list of `(value, label)` options
    Choice(Vec<(String, String)>),
    Multiline,
}

/// A single constraint on a field value
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    PasswordStrength(usize),
    /// Must equal another field of the same step
    Matches(&'static str),
    Digits(usize),
    Phone,
    Url,
    Version,
    Decimal { min: f64 },
    OneOf(Vec<String>),
    /// Comma-separated list whose entries all come from the options
    EachOneOf(Vec<String>),
}

/// One input of a step
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    pub placeholder: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            rules: Vec::new(),
            placeholder: None,
        }
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Choice field whose options double as the allowed values
    pub fn choice(mut self, options: Vec<(String, String)>) -> Self {
        let values = options.iter().map(|(v, _)| v.clone()).collect();
        self.kind = FieldKind::Choice(options);
        self.rules.push(Rule::OneOf(values));
        self
    }
}

/// Inputs of one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSchema {
    pub fields: Vec<FieldSpec>,
}

impl StepSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Schema for steps without inputs (review, done)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `values` against every field. At most one message per field:
    /// the first rule that fails.
    pub fn validate(&self, values: &StepFields) -> ValidationReport {
        let mut errors = BTreeMap::new();
        for spec in &self.fields {
            let value = values.get(spec.name).map(String::as_str).unwrap_or("");
            if let Some(reason) = self.check_field(spec, value, values) {
                errors.insert(spec.name.to_string(), format!("{} {}", spec.label, reason));
            }
        }
        ValidationReport { errors }
    }

    fn check_field(&self, spec: &FieldSpec, value: &str, values: &StepFields) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return spec
                .is_required()
                .then(|| "is required".to_string());
        }

        spec.rules
            .iter()
            .find_map(|rule| self.check_rule(rule, value, values))
    }

    fn check_rule(&self, rule: &Rule, value: &str, values: &StepFields) -> Option<String> {
        let trimmed = value.trim();
        match rule {
            Rule::Required => None,
            Rule::Email => {
                (!EMAIL_RE.is_match(trimmed)).then(|| "must be a valid email address".to_string())
            }
            Rule::MinLength(n) => (trimmed.chars().count() < *n)
                .then(|| format!("must be at least {} characters", n)),
            Rule::MaxLength(n) => (trimmed.chars().count() > *n)
                .then(|| format!("must be at most {} characters", n)),
            Rule::PasswordStrength(min) => password_problem(value, *min),
            Rule::Matches(other) => {
                let other_value = values.get(*other).map(String::as_str).unwrap_or("");
                let other_label = self.field(other).map(|f| f.label).unwrap_or(other);
                (value != other_value).then(|| format!("must match {}", other_label))
            }
            Rule::Digits(n) => {
                let ok = trimmed.len() == *n && trimmed.chars().all(|c| c.is_ascii_digit());
                (!ok).then(|| format!("must be exactly {} digits", n))
            }
            Rule::Phone => (!is_phone(trimmed)).then(|| "must be a valid phone number".to_string()),
            Rule::Url => (!URL_RE.is_match(trimmed))
                .then(|| "must be a valid URL starting with http:// or https://".to_string()),
            Rule::Version => (!VERSION_RE.is_match(trimmed))
                .then(|| "must be a version like 1.0.0".to_string()),
            Rule::Decimal { min } => {
                if !DECIMAL_RE.is_match(trimmed) {
                    return Some("must be a number with at most two decimal places".to_string());
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n >= *min => None,
                    _ => Some(format!("must be at least {}", min)),
                }
            }
            Rule::OneOf(options) => (!options.iter().any(|o| o == trimmed))
                .then(|| format!("must be one of: {}", options.join(", "))),
            Rule::EachOneOf(options) => split_list(trimmed)
                .any(|item| !options.iter().any(|o| o == item))
                .then(|| format!("may only list: {}", options.join(", "))),
        }
    }
}

/// Entries of a comma-separated list, trimmed, blanks dropped
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn password_problem(value: &str, min: usize) -> Option<String> {
    if value.chars().count() < min {
        return Some(format!("must be at least {} characters", min));
    }
    if !value.chars().any(|c| c.is_uppercase()) {
        return Some("must contain an uppercase letter".to_string());
    }
    if !value.chars().any(|c| c.is_lowercase()) {
        return Some("must contain a lowercase letter".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Some("must contain a number".to_string());
    }
    if !value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Some("must contain a special character".to_string());
    }
    None
}

fn is_phone(value: &str) -> bool {
    let body = value.strip_prefix('+').unwrap_or(value);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

/// Verdict for one step: field name to message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Combine the verdicts of several steps
    pub fn merge(mut self, other: ValidationReport) -> Self {
        self.errors.extend(other.errors);
        self
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}
