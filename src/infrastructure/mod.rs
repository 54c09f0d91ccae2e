//! Infrastructure layer - External service implementations

pub mod account;
pub mod auth;
pub mod logging;
pub mod mail;
pub mod storage;
