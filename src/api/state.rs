//! Application state for shared services

use std::sync::Arc;

use sqlx::PgPool;

use crate::infrastructure::account::AccountService;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    /// Set when accounts live in PostgreSQL; probed by `/ready`
    pub database: Option<PgPool>,
}

impl AppState {
    pub fn new(account_service: Arc<AccountService>) -> Self {
        Self {
            account_service,
            database: None,
        }
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }
}
