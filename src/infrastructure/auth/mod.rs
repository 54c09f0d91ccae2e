//! Authentication infrastructure module
//!
//! This module provides signed API tokens derived from a verified account.

mod jwt;

pub use jwt::{ApiTokenClaims, ApiTokenIssuer, LOGIN_ACTION};
