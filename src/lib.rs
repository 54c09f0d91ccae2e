//! Account Service
//!
//! User accounts over HTTP:
//! - Signup with an emailed welcome link
//! - Password login returning a persistent login token and a signed API token
//! - Single-use reset tokens for setting and recovering passwords
//! - Profile retrieval, update and soft deletion

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use api::state::AppState;
use crate::config::AuthConfig;
use domain::account::{AccountRepository, TokenSource};
use domain::DomainError;
use infrastructure::{
    account::{
        AccountService, InMemoryAccountRepository, PostgresAccountRepository, TokenGenerator,
    },
    mail::{create_mail_sender, MailTemplates},
    storage,
};

/// Wire the account service from configuration.
///
/// With `database.url` set, accounts live in PostgreSQL and pending
/// migrations run first; otherwise they are kept in memory.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let mailer = create_mail_sender(&config.mail)?;
    let templates = MailTemplates::new(&config.mail)?;

    let mut pool = None;
    let repository: Arc<dyn AccountRepository> = match &config.database.url {
        Some(url) => {
            let pg = storage::connect(url, &config.database).await?;
            let applied = storage::run_migrations(&pg).await?;
            info!(applied, "Account schema up to date");
            pool = Some(pg.clone());
            Arc::new(PostgresAccountRepository::new(pg))
        }
        None => {
            warn!("No database configured; accounts are kept in memory and lost on restart");
            Arc::new(InMemoryAccountRepository::new())
        }
    };

    let auth = with_api_token_secret(&config.auth)?;
    let service = AccountService::new(repository, mailer, templates, &auth)?;
    let state = AppState::new(Arc::new(service));

    Ok(match pool {
        Some(pool) => state.with_database(pool),
        None => state,
    })
}

/// Fill in a random API token secret when none is configured
fn with_api_token_secret(auth: &AuthConfig) -> Result<AuthConfig, DomainError> {
    let mut auth = auth.clone();

    if auth.api_token.secret.as_deref().is_none_or(str::is_empty) {
        warn!(
            "No API token secret configured (APP__AUTH__API_TOKEN__SECRET). \
            Generating a random one; API tokens will NOT stay valid across restarts."
        );
        auth.api_token.secret = Some(TokenGenerator::new(48).generate()?);
    }

    Ok(auth)
}
