//! In-memory account repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::AccountRepository;
use crate::domain::{Account, AccountId, DomainError};

#[derive(Debug, Default)]
struct Store {
    accounts: HashMap<AccountId, Account>,
    /// Index for email -> account ID lookup, live accounts only
    email_index: HashMap<String, AccountId>,
}

/// In-memory implementation of AccountRepository
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryAccountRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live accounts
    pub async fn len(&self) -> usize {
        self.store.read().await.email_index.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let store = self.store.read().await;
        Ok(store.accounts.get(id).filter(|a| !a.is_deleted()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let store = self.store.read().await;

        Ok(store
            .email_index
            .get(email)
            .and_then(|id| store.accounts.get(id))
            .cloned())
    }

    async fn create(&self, mut account: Account) -> Result<Account, DomainError> {
        let mut store = self.store.write().await;

        if store.accounts.contains_key(account.id())
            || store.email_index.contains_key(account.email())
        {
            return Err(DomainError::conflict("User exists"));
        }

        account.mark_persisted();
        if !account.is_deleted() {
            store
                .email_index
                .insert(account.email().to_string(), *account.id());
        }
        store.accounts.insert(*account.id(), account.clone());

        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<Account, DomainError> {
        let mut store = self.store.write().await;

        let stored = store
            .accounts
            .get(account.id())
            .filter(|a| !a.is_deleted())
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", account.id())))?;

        if stored.reset_token() != account.persisted_reset_token() {
            return Err(DomainError::conflict("account was modified concurrently"));
        }

        let old_email = stored.email().to_string();

        if !account.is_deleted()
            && old_email != account.email()
            && store.email_index.contains_key(account.email())
        {
            return Err(DomainError::conflict("email exists already"));
        }

        store.email_index.remove(&old_email);
        if !account.is_deleted() {
            store
                .email_index
                .insert(account.email().to_string(), *account.id());
        }

        let mut updated = account.clone();
        updated.mark_persisted();
        store.accounts.insert(*updated.id(), updated.clone());

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::TokenSource;

    #[derive(Debug)]
    struct FixedTokens(&'static str);

    impl TokenSource for FixedTokens {
        fn generate(&self) -> Result<String, DomainError> {
            Ok(self.0.to_string())
        }
    }

    fn account(email: &str) -> Account {
        let mut account = Account::new(email, None).unwrap();
        account.gen_login_token(&FixedTokens("login")).unwrap();
        account
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryAccountRepository::new();
        let created = repo.create(account("a@b.com")).await.unwrap();

        let by_id = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(by_id.email(), "a@b.com");

        let by_email = repo.get_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id(), created.id());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("a@b.com")).await.unwrap();

        let result = repo.create(account("a@b.com")).await;
        match result {
            Err(DomainError::Conflict { message }) => assert_eq!(message, "User exists"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let result = repo.update(&account("a@b.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_email_moves_index() {
        let repo = InMemoryAccountRepository::new();
        let mut created = repo.create(account("a@b.com")).await.unwrap();

        created.set_email("c@d.com").unwrap();
        repo.update(&created).await.unwrap();

        assert!(repo.get_by_email("a@b.com").await.unwrap().is_none());
        assert!(repo.get_by_email("c@d.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_email_taken() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("taken@b.com")).await.unwrap();
        let mut created = repo.create(account("a@b.com")).await.unwrap();

        created.set_email("taken@b.com").unwrap();
        let result = repo.update(&created).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_stale_reset_token_snapshot_conflicts() {
        let repo = InMemoryAccountRepository::new();
        let mut created = repo.create(account("a@b.com")).await.unwrap();
        created.gen_reset_token(&FixedTokens("reset")).unwrap();
        repo.update(&created).await.unwrap();

        // Two requests load the account while the reset token is pending
        let mut first = repo.get(created.id()).await.unwrap().unwrap();
        let mut second = repo.get(created.id()).await.unwrap().unwrap();

        first.clear_reset_token();
        repo.update(&first).await.unwrap();

        second.clear_reset_token();
        let result = repo.update(&second).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_deleted_account_frees_email() {
        let repo = InMemoryAccountRepository::new();
        let mut created = repo.create(account("a@b.com")).await.unwrap();

        created.mark_deleted();
        repo.update(&created).await.unwrap();

        assert!(repo.get(created.id()).await.unwrap().is_none());
        assert!(repo.get_by_email("a@b.com").await.unwrap().is_none());
        assert!(repo.create(account("a@b.com")).await.is_ok());

        let result = repo.update(&created).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
