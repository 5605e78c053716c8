use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A single field-level validation failure, rendered inline by forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Checks the shape of an email/password pair submitted to register or login.
///
/// # Errors
/// Returns every failing field.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if !is_plausible_email(email) {
        errors.push(FieldError::new("email", "Must be a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new("password", format!("Must be at least {MIN_PASSWORD_LEN} characters")));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Emails are compared case-insensitively.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
