//! Signed API token issuance and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use tracing::warn;

use crate::config::ApiTokenConfig;
use crate::domain::account::{Account, AccountExtension};
use crate::domain::DomainError;

/// Action tag carried by every API token issued on login
pub const LOGIN_ACTION: &str = "login";

const RESERVED_CLAIMS: [&str; 5] = ["id", "email", "action", "iat", "exp"];

/// Upper bound for `expire_seconds` (ten years)
const MAX_EXPIRE_SECONDS: u64 = 60 * 60 * 24 * 365 * 10;

/// API token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTokenClaims {
    /// Account ID
    pub id: String,
    pub email: String,
    pub action: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Deployment-specific claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiTokenClaims {
    /// Create login claims for an account
    pub fn new(account: &Account, expires_in: Duration, extra: Map<String, Value>) -> Self {
        let now = Utc::now();
        let exp = now + expires_in;

        Self {
            id: account.id().to_string(),
            email: account.email().to_string(),
            action: LOGIN_ACTION.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            extra,
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues HS256-signed, time-boxed API tokens from a shared secret
#[derive(Clone)]
pub struct ApiTokenIssuer {
    expires_in: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for ApiTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenIssuer")
            .field("expires_in", &self.expires_in)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl ApiTokenIssuer {
    /// Build an issuer from the token settings.
    ///
    /// Fails with `Configuration` when the secret is missing or empty, or when
    /// `expire_seconds` is zero or above ten years.
    pub fn new(config: &ApiTokenConfig) -> Result<Self, DomainError> {
        let secret = config
            .secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| DomainError::configuration("auth.api_token.secret is not set"))?;

        let expires_in = Some(config.expire_seconds)
            .filter(|seconds| (1..=MAX_EXPIRE_SECONDS).contains(seconds))
            .and_then(|seconds| i64::try_from(seconds).ok())
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "auth.api_token.expire_seconds must be between 1 and {}, got {}",
                    MAX_EXPIRE_SECONDS, config.expire_seconds
                ))
            })?;

        Ok(Self {
            expires_in,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Sign an API token for a verified account.
    ///
    /// Fails with `Fatal` when the in-memory account is incomplete; that can
    /// only happen through a programming error upstream.
    pub fn issue(
        &self,
        account: &Account,
        extension: &dyn AccountExtension,
    ) -> Result<String, DomainError> {
        account.check_integrity().map_err(|e| {
            DomainError::fatal(format!("API token requested for an invalid account: {}", e))
        })?;

        let mut extra = extension.extra_claims(account);
        for key in RESERVED_CLAIMS {
            if extra.remove(key).is_some() {
                warn!(claim = key, "Extension tried to override a reserved API token claim");
            }
        }

        let claims = ApiTokenClaims::new(account, self.expires_in, extra);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::fatal(format!("Failed to sign API token: {}", e)))
    }

    /// Decode a token, checking signature, expiry and the login action tag
    pub fn validate(&self, token: &str) -> Result<ApiTokenClaims, DomainError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<ApiTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::unauthorized(format!("Invalid API token: {}", e)))?;

        if token_data.claims.action != LOGIN_ACTION {
            return Err(DomainError::unauthorized("Invalid API token: wrong action"));
        }

        Ok(token_data.claims)
    }
}
