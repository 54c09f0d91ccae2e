//! Credential verification
//!
//! An inbound request presents an email plus one secret. The secret may be the
//! account password, its persistent login token, or a pending reset token;
//! verification turns it into a [`VerifiedAccount`] tagged with which one
//! matched so that later steps never have to re-derive intent from state.

use std::fmt::Debug;

use super::entity::Account;
use crate::domain::DomainError;

/// Trait for password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Source of random opaque tokens
pub trait TokenSource: Send + Sync + Debug {
    /// Generate a fresh token. Fails only when the entropy source does.
    fn generate(&self) -> Result<String, DomainError>;
}

/// Which stored secret a presented credential matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMatch {
    Password,
    LoginToken,
    ResetToken,
}

/// An account whose credentials were checked during this request
#[derive(Debug, Clone)]
pub struct VerifiedAccount {
    account: Account,
    matched: CredentialMatch,
}

impl VerifiedAccount {
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    pub fn into_account(self) -> Account {
        self.account
    }

    pub fn matched(&self) -> CredentialMatch {
        self.matched
    }

    /// True when this request spent the account's reset token.
    ///
    /// The token is already cleared in memory; the caller must persist the
    /// account before the request completes.
    pub fn reset_consumed(&self) -> bool {
        self.matched == CredentialMatch::ResetToken
    }
}

/// Verify a password against the account's stored hash
pub fn verify_password(
    account: Account,
    password: &str,
    hasher: &dyn PasswordHasher,
) -> Result<VerifiedAccount, DomainError> {
    let hash = account
        .password_hash()
        .ok_or_else(|| DomainError::unauthorized("Unauthorized"))?;

    if password.is_empty() || !hasher.verify(password, hash) {
        return Err(DomainError::unauthorized("Unauthorized"));
    }

    Ok(VerifiedAccount {
        account,
        matched: CredentialMatch::Password,
    })
}

/// Verify a bearer token against the login token and the reset token.
///
/// A matching reset token is consumed on the spot.
pub fn verify_token(mut account: Account, token: &str) -> Result<VerifiedAccount, DomainError> {
    if token.is_empty() {
        return Err(DomainError::unauthorized("Unauthorized"));
    }

    let matches = |stored: Option<&str>| stored.is_some_and(|s| constant_time_eq(s, token));

    let matched = if matches(account.login_token()) {
        CredentialMatch::LoginToken
    } else if matches(account.reset_token()) {
        account.clear_reset_token();
        CredentialMatch::ResetToken
    } else {
        return Err(DomainError::unauthorized("Unauthorized"));
    };

    Ok(VerifiedAccount { account, matched })
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
