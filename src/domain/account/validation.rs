//! Account validation utilities

use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur during account validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("name to short")]
    NameTooShort(usize),

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Invalid account ID: {0}")]
    InvalidId(String),
}

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Lowercase and trim an email address.
///
/// Every comparison and every stored email goes through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address (after normalization)
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.is_empty() {
        return Err(AccountValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AccountValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    // validator accepts dotless domains; a deliverable address needs one
    let has_dotted_domain = email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.') && !domain.ends_with('.'));

    if !email.validate_email() || !has_dotted_domain {
        return Err(AccountValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a display name
///
/// Rules:
/// - At least `min_length` characters (configurable per deployment)
/// - Maximum 100 characters
pub fn validate_name(name: &str, min_length: usize) -> Result<(), AccountValidationError> {
    let length = name.trim().chars().count();

    if length < min_length {
        return Err(AccountValidationError::NameTooShort(min_length));
    }

    if length > MAX_NAME_LENGTH {
        return Err(AccountValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate a new password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), AccountValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
