//! Account repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Account, AccountId};
use crate::domain::DomainError;

/// Repository trait for account storage.
///
/// Soft-deleted accounts are invisible to every lookup.
#[async_trait]
pub trait AccountRepository: Send + Sync + Debug {
    /// Get a live account by its ID
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Get a live account by its (already normalized) email
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Insert a new account. A taken email fails with `Conflict`.
    async fn create(&self, account: Account) -> Result<Account, DomainError>;

    /// Write the full account snapshot back.
    ///
    /// Fails with `NotFound` if the account is gone and with `Conflict` if the
    /// stored reset token no longer equals `account.persisted_reset_token()`
    /// or the new email is taken.
    async fn update(&self, account: &Account) -> Result<Account, DomainError>;

    /// Check if a live account already uses this email
    async fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

/// Load a live account by email or fail with `NotFound`
pub async fn find_by_email(
    repository: &dyn AccountRepository,
    email: &str,
) -> Result<Account, DomainError> {
    repository
        .get_by_email(email)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", email)))
}
