//! Account infrastructure - hashing, tokens, repositories and the account service

mod password;
mod postgres_repository;
mod repository;
mod service;
mod token;

pub use password::Argon2Hasher;
pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{
    AccountProfile, AccountService, LoginResult, SignupRequest, UpdateAccountRequest,
};
pub use token::TokenGenerator;
