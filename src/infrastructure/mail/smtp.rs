//! SMTP delivery with lettre

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::{debug, info};

use super::sender::MailSender;
use crate::config::SmtpConfig;
use crate::domain::DomainError;

/// Delivers mail through an authenticated SMTP relay (STARTTLS required)
#[derive(Clone)]
pub struct SmtpMailSender {
    from: Mailbox,
    transport: SmtpTransport,
}

impl std::fmt::Debug for SmtpMailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailSender")
            .field("from", &self.from.to_string())
            .field("transport", &"[smtp]")
            .finish()
    }
}

impl SmtpMailSender {
    pub fn new(from: &str, config: &SmtpConfig) -> Result<Self, DomainError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| DomainError::configuration(format!("Invalid from address: {}", e)))?;

        let transport = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| {
                DomainError::configuration(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        info!(host = %config.host, port = config.port, "SMTP mail transport configured");

        Ok(Self { from, transport })
    }

    fn build_message(&self, address: &str, body: &str, subject: &str) -> Result<Message, DomainError> {
        let to: Mailbox = address
            .parse()
            .map_err(|e| DomainError::mail(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DomainError::mail(format!("Failed to build mail: {}", e)))
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, address: &str, body: &str, subject: &str) -> Result<(), DomainError> {
        let message = self.build_message(address, body, subject)?;
        let transport = self.transport.clone();

        // lettre's SmtpTransport blocks
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| DomainError::mail(format!("Mail task failed: {}", e)))?
            .map_err(|e| DomainError::mail(format!("Failed to send mail: {}", e)))?;

        debug!(to = %address, "Mail delivered");
        Ok(())
    }
}
