//! Mail sender trait and the logging transport

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::info;

use crate::domain::DomainError;

/// Outbound mail delivery.
///
/// The account core does not catch or retry failures; an error here fails the
/// request that triggered the mail.
#[async_trait]
pub trait MailSender: Send + Sync + Debug {
    async fn send(&self, address: &str, body: &str, subject: &str) -> Result<(), DomainError>;
}

/// Writes mails to the log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogMailSender;

impl LogMailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, address: &str, body: &str, subject: &str) -> Result<(), DomainError> {
        info!(to = %address, subject = %subject, body = %body, "Mail (log transport)");
        Ok(())
    }
}
