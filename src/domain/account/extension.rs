//! Per-deployment account customization

use serde_json::{Map, Value};
use std::fmt::Debug;

use super::entity::Account;
use crate::domain::DomainError;

/// Capability injected by a deployment that needs extra account fields
/// or extra API-token claims.
pub trait AccountExtension: Send + Sync + Debug {
    /// Check the fields a signup request carried beyond `email` and `name`.
    ///
    /// Returns the subset to store on the account.
    fn validate_extra_fields(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DomainError>;

    /// Claims merged into every API token issued for `account`
    fn extra_claims(&self, account: &Account) -> Map<String, Value>;
}

/// Default extension: extra signup fields are dropped, no extra claims
#[derive(Debug, Clone, Default)]
pub struct NoExtension;

impl AccountExtension for NoExtension {
    fn validate_extra_fields(
        &self,
        _fields: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DomainError> {
        Ok(Map::new())
    }

    fn extra_claims(&self, _account: &Account) -> Map<String, Value> {
        Map::new()
    }
}
