//! Account field validation used by user creation, bulk import and
//! profile updates.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Minimum password length enforced on account creation.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum number of accounts accepted by one bulk import.
pub const MAX_BULK_USERS: usize = 100;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Validate an email address shape (`local@domain.tld`, no whitespace).
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if !EMAIL_RE.is_match(email) {
        return Err(CoreError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

/// Validate that a required text field is present and not blank.
pub fn validate_required(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate that a password meets minimum strength requirements.
pub fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Validate the size of a bulk import batch.
pub fn validate_bulk_size(count: usize) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation(
            "Users array cannot be empty".to_string(),
        ));
    }
    if count > MAX_BULK_USERS {
        return Err(CoreError::Validation(format!(
            "Cannot create more than {MAX_BULK_USERS} users at once"
        )));
    }
    Ok(())
}

/// Values that appear more than once in `values`, in first-repeat order.
pub fn find_duplicates<'a, I>(values: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for value in values {
        if !seen.insert(value) && reported.insert(value) {
            duplicates.push(value);
        }
    }
    duplicates
}
