//! API middleware components

pub mod credentials;
pub mod security;

pub use credentials::BasicCredentials;
pub use security::security_headers_middleware;
