//! Field validation rules.
//!
//! Each field has an ordered list of rules. Rules run in order and the first
//! failure is recorded for that field; later rules for the same field are
//! skipped. Storage lookups (uniqueness, lookup ranges) are done by the
//! service; uniqueness results are passed in through [`Uniqueness`] so the
//! `unique` rule keeps its place in each field's order.

use std::fmt;

use serde::Serialize;
use validator::ValidateEmail;

use crate::constants::{MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};
use crate::user::User;

pub const FIELD_USERNAME: &str = "username";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_STATUS_ID: &str = "status_id";
pub const FIELD_ROLE_ID: &str = "role_id";
pub const FIELD_USER_TYPE_ID: &str = "user_type_id";
pub const FIELD_PASSWORD: &str = "password";

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Failed rules in the order they were detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record an error unless the field already failed an earlier rule.
    pub fn add(&mut self, error: FieldError) {
        if !self.has_field(error.field) {
            self.errors.push(error);
        }
    }

    /// Append `other`, keeping this collection's earlier failures.
    pub fn merge(&mut self, other: ValidationErrors) {
        for error in other.errors {
            self.add(error);
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Outcome of one rule
pub type RuleResult = Result<(), FieldError>;

/// Run `rules` in order, stopping at the first failure.
pub fn run_rules(errors: &mut ValidationErrors, rules: &[&dyn Fn() -> RuleResult]) {
    for rule in rules {
        if let Err(e) = rule() {
            errors.add(e);
            return;
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

pub fn required(field: &'static str, value: &str) -> RuleResult {
    if value.is_empty() {
        return Err(FieldError::new(field, "required", format!("{} cannot be blank.", label(field))));
    }
    Ok(())
}

/// Length in characters, inclusive on both ends.
pub fn length(field: &'static str, value: &str, min: usize, max: usize) -> RuleResult {
    let len = value.chars().count();
    if len < min {
        return Err(FieldError::new(
            field,
            "too_short",
            format!("{} should contain at least {} characters.", label(field), min),
        ));
    }
    if len > max {
        return Err(FieldError::new(
            field,
            "too_long",
            format!("{} should contain at most {} characters.", label(field), max),
        ));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> RuleResult {
    if !value.validate_email() {
        return Err(FieldError::new(
            field,
            "email",
            format!("{} is not a valid email address.", label(field)),
        ));
    }
    Ok(())
}

pub fn in_range<I>(field: &'static str, value: i32, allowed: I) -> RuleResult
where
    I: IntoIterator<Item = i32>,
{
    if !allowed.into_iter().any(|v| v == value) {
        return Err(FieldError::new(field, "in", format!("{} is invalid.", label(field))));
    }
    Ok(())
}

/// Fails when a storage lookup found another row with this value.
pub fn unique(field: &'static str, value: &str, taken: bool) -> RuleResult {
    if taken {
        return Err(FieldError::new(
            field,
            "unique",
            format!("{} \"{}\" has already been taken.", label(field), value),
        ));
    }
    Ok(())
}

fn label(field: &str) -> &str {
    match field {
        FIELD_USERNAME => "Username",
        FIELD_EMAIL => "Email",
        FIELD_STATUS_ID => "Status",
        FIELD_ROLE_ID => "Role",
        FIELD_USER_TYPE_ID => "User Type",
        FIELD_PASSWORD => "Password",
        other => other,
    }
}

/// Results of the uniqueness lookups for a user's username and email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uniqueness {
    pub username_taken: bool,
    pub email_taken: bool,
}

/// Trim filters applied before any rule runs.
pub fn normalize_user_fields(user: &mut User) {
    user.username = user.username.trim().to_string();
    user.email = user.email.trim().to_string();
}

/// Apply the trim filters, then every username and email rule in order,
/// using `uniqueness` for the `unique` rules.
pub fn validate_user_fields_with(user: &mut User, uniqueness: Uniqueness) -> ValidationErrors {
    normalize_user_fields(user);

    let mut errors = ValidationErrors::new();

    run_rules(
        &mut errors,
        &[
            &|| required(FIELD_USERNAME, &user.username),
            &|| unique(FIELD_USERNAME, &user.username, uniqueness.username_taken),
            &|| length(FIELD_USERNAME, &user.username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH),
        ],
    );
    run_rules(
        &mut errors,
        &[
            &|| required(FIELD_EMAIL, &user.email),
            &|| email(FIELD_EMAIL, &user.email),
            &|| unique(FIELD_EMAIL, &user.email, uniqueness.email_taken),
        ],
    );

    errors
}

/// Rules for a new plain text password under a configured minimum length.
pub fn validate_password_policy(password: &str, min_length: usize) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    run_rules(
        &mut errors,
        &[
            &|| required(FIELD_PASSWORD, password),
            &|| length(FIELD_PASSWORD, password, min_length, usize::MAX),
        ],
    );

    errors
}
