//! Account domain
//!
//! This module provides domain types and traits for account authentication:
//! the account entity with its token lifecycle, credential verification,
//! validation, the repository trait and the per-deployment extension hook.

mod credential;
mod entity;
mod extension;
mod repository;
mod validation;

pub use credential::{
    constant_time_eq, verify_password, verify_token, CredentialMatch, PasswordHasher,
    TokenSource, VerifiedAccount,
};
pub use entity::{Account, AccountId, AccountRecord, AccountState};
pub use extension::{AccountExtension, NoExtension};
pub use repository::{find_by_email, AccountRepository};
pub use validation::{
    normalize_email, validate_email, validate_name, validate_password, AccountValidationError,
};

#[cfg(test)]
pub use repository::mock::MockAccountRepository;
