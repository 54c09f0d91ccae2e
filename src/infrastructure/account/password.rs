//! Password hashing using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordHashConfig;
use crate::domain::account::PasswordHasher;
use crate::domain::DomainError;

/// Argon2id password hasher
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher with the argon2 crate's default cost
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a hasher with explicit memory (KiB) and iteration cost
    pub fn with_params(memory_kib: u32, iterations: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| DomainError::configuration(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    pub fn from_config(config: &PasswordHashConfig) -> Result<Self, DomainError> {
        Self::with_params(config.memory_kib, config.iterations)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::fatal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // cost parameters are read from the PHC string itself
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(8, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("a12345678").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("a12345678", &hash));
        assert!(!hasher.verify("b12345678", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap_hasher();

        let hash1 = hasher.hash("a12345678").unwrap();
        let hash2 = hasher.hash("a12345678").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("a12345678", &hash1));
        assert!(hasher.verify("a12345678", &hash2));
    }

    #[test]
    fn test_verify_across_cost_settings() {
        let hash = cheap_hasher().hash("a12345678").unwrap();
        let other = Argon2Hasher::with_params(16, 2).unwrap();
        assert!(other.verify("a12345678", &hash));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = cheap_hasher();

        assert!(!hasher.verify("password", "invalid_hash_format"));
        assert!(!hasher.verify("password", ""));
    }

    #[test]
    fn test_invalid_params() {
        let result = Argon2Hasher::with_params(1, 0);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
