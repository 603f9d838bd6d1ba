//! Request validation utilities using the validator crate.
//!
//! Helpers here validate HTTP request payload fields before they reach the
//! account store.

use validator::{ValidateEmail, ValidationError};

/// Validates that a string is a syntactically valid email address.
///
/// Syntax only: no deliverability check, no normalization. Matching against
/// stored accounts stays byte-exact.
///
/// # Errors
///
/// Returns a `ValidationError` if the string is not a valid address.
pub fn validate_email_syntax(value: &str) -> Result<(), ValidationError> {
    if !value.validate_email() {
        return Err(ValidationError::new("invalid_email"));
    }
    Ok(())
}
