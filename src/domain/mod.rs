//! Domain layer - account entity, credential lifecycle and core traits

pub mod account;
mod error;

pub use account::{Account, AccountId, AccountState, CredentialMatch, VerifiedAccount};
pub use error::DomainError;
