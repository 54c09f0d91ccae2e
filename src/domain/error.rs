use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Entropy exhaustion or an account in an impossible state. Never retried.
    #[error("Fatal error: {message}")]
    Fatal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Mail error: {message}")]
    Mail { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn mail(message: impl Into<String>) -> Self {
        Self::Mail {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Collapse a missing record into a credential failure.
    ///
    /// Used at the authentication boundary so that callers cannot tell
    /// "no such account" apart from "wrong credentials".
    pub fn not_found_as_unauthorized(self) -> Self {
        match self {
            Self::NotFound { .. } => Self::unauthorized("User not found"),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_error() {
        let error = DomainError::bad_request("nothing to update");
        assert_eq!(error.to_string(), "Bad request: nothing to update");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("User exists");
        assert_eq!(error.to_string(), "Conflict: User exists");
    }

    #[test]
    fn test_not_found_becomes_unauthorized() {
        let error = DomainError::not_found("Account 'x' not found").not_found_as_unauthorized();
        assert!(matches!(error, DomainError::Unauthorized { .. }));
        assert_eq!(error.to_string(), "Unauthorized: User not found");
    }

    #[test]
    fn test_other_errors_pass_through_auth_boundary() {
        let error = DomainError::storage("connection reset").not_found_as_unauthorized();
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
