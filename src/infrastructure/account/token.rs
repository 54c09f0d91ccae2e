//! Login and reset token generation

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::domain::account::TokenSource;
use crate::domain::DomainError;

/// Generator for opaque bearer tokens
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    /// Number of random bytes per token, before encoding
    token_bytes: usize,
}

impl TokenGenerator {
    pub fn new(token_bytes: usize) -> Self {
        Self { token_bytes }
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TokenSource for TokenGenerator {
    fn generate(&self) -> Result<String, DomainError> {
        let mut random_bytes = vec![0u8; self.token_bytes];

        OsRng
            .try_fill_bytes(&mut random_bytes)
            .map_err(|e| DomainError::fatal(format!("Could not generate token: {}", e)))?;

        Ok(STANDARD.encode(&random_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length() {
        let token = TokenGenerator::default().generate().unwrap();

        // 32 bytes base64-encoded = 44 chars with padding
        assert_eq!(token.len(), 44);
        assert_eq!(STANDARD.decode(&token).unwrap().len(), 32);
    }

    #[test]
    fn test_custom_length() {
        let token = TokenGenerator::new(64).generate().unwrap();
        assert_eq!(STANDARD.decode(&token).unwrap().len(), 64);
    }

    #[test]
    fn test_token_uniqueness() {
        let generator = TokenGenerator::default();
        assert_ne!(generator.generate().unwrap(), generator.generate().unwrap());
    }
}
