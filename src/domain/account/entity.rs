//! Account entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::credential::TokenSource;
use super::validation::{normalize_email, validate_email, AccountValidationError};
use crate::domain::DomainError;

/// Account identifier - a random UUID assigned at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form
    pub fn parse(id: &str) -> Result<Self, AccountValidationError> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| AccountValidationError::InvalidId(id.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an account sits in the credential lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Only the login token is outstanding
    Normal,
    /// A reset token has been issued and not yet spent
    ResetPending,
    /// Soft-deleted; both tokens are gone
    Deleted,
}

/// Every persisted column of an account, used by repositories to rebuild one
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub login_token: Option<String>,
    pub reset_token: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub extra: Map<String, Value>,
}

/// A user account
#[derive(Clone)]
pub struct Account {
    id: AccountId,
    email: String,
    name: Option<String>,
    password_hash: Option<String>,
    login_token: Option<String>,
    reset_token: Option<String>,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    extra: Map<String, Value>,
    /// Reset token as last read from or written to the store.
    /// Repositories only accept an update while the stored value still equals it.
    persisted_reset_token: Option<String>,
}

impl Account {
    /// Create a new, not yet persisted account with no password and no tokens
    pub fn new(email: &str, name: Option<String>) -> Result<Self, AccountValidationError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let now = Utc::now();

        Ok(Self {
            id: AccountId::generate(),
            email,
            name,
            password_hash: None,
            login_token: None,
            reset_token: None,
            deleted: false,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
            persisted_reset_token: None,
        })
    }

    /// Rebuild an account from storage
    pub fn restore(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            password_hash: record.password_hash,
            persisted_reset_token: record.reset_token.clone(),
            login_token: record.login_token,
            reset_token: record.reset_token,
            deleted: record.deleted,
            created_at: record.created_at,
            updated_at: record.updated_at,
            extra: record.extra,
        }
    }

    /// Snapshot every column for storage
    pub fn to_record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            password_hash: self.password_hash.clone(),
            login_token: self.login_token.clone(),
            reset_token: self.reset_token.clone(),
            deleted: self.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
            extra: self.extra.clone(),
        }
    }

    // Getters

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn login_token(&self) -> Option<&str> {
        self.login_token.as_deref()
    }

    pub fn reset_token(&self) -> Option<&str> {
        self.reset_token.as_deref()
    }

    pub fn persisted_reset_token(&self) -> Option<&str> {
        self.persisted_reset_token.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    // State checks

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_token.is_some()
    }

    pub fn state(&self) -> AccountState {
        if self.deleted {
            AccountState::Deleted
        } else if self.reset_pending() {
            AccountState::ResetPending
        } else {
            AccountState::Normal
        }
    }

    /// Check the in-memory snapshot is complete enough to vouch for.
    ///
    /// A failure here is a programming error, not a user-facing condition.
    pub fn check_integrity(&self) -> Result<(), DomainError> {
        if self.deleted {
            return Err(DomainError::fatal(format!(
                "account '{}' is deleted",
                self.id
            )));
        }

        if self.login_token.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::fatal(format!(
                "account '{}' has no login token",
                self.id
            )));
        }

        validate_email(&self.email).map_err(|e| {
            DomainError::fatal(format!("account '{}' has a corrupt email: {}", self.id, e))
        })
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.touch();
    }

    /// Replace the email; the new value is normalized and validated
    pub fn set_email(&mut self, email: &str) -> Result<(), AccountValidationError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        self.email = email;
        self.touch();
        Ok(())
    }

    pub fn set_extra(&mut self, extra: Map<String, Value>) {
        self.extra = extra;
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = Some(password_hash.into());
        self.touch();
    }

    /// Issue a new login token, overwriting the previous one
    pub fn gen_login_token(&mut self, tokens: &dyn TokenSource) -> Result<(), DomainError> {
        self.login_token = Some(tokens.generate()?);
        self.touch();
        Ok(())
    }

    /// Issue a new reset token, leaving the login token untouched
    pub fn gen_reset_token(&mut self, tokens: &dyn TokenSource) -> Result<(), DomainError> {
        self.reset_token = Some(tokens.generate()?);
        self.touch();
        Ok(())
    }

    pub fn clear_reset_token(&mut self) {
        if self.reset_token.take().is_some() {
            self.touch();
        }
    }

    /// Soft delete: drop both tokens and flag the row
    pub fn mark_deleted(&mut self) {
        self.login_token = None;
        self.reset_token = None;
        self.deleted = true;
        self.touch();
    }

    /// Record that the current state now matches the store
    pub fn mark_persisted(&mut self) {
        self.persisted_reset_token = self.reset_token.clone();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "[hidden]"))
            .field("login_token", &self.login_token.as_ref().map(|_| "[hidden]"))
            .field("reset_token", &self.reset_token.as_ref().map(|_| "[hidden]"))
            .field("deleted", &self.deleted)
            .field("created_at", &self.created_at)
            .finish()
    }
}
