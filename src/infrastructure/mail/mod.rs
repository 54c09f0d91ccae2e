//! Mail infrastructure module
//!
//! Outbound mail for the account lifecycle: the sender trait with log and
//! SMTP transports, and the templates that embed reset links.

mod sender;
mod smtp;
mod templates;

use std::sync::Arc;

pub use sender::{LogMailSender, MailSender};
pub use smtp::SmtpMailSender;
pub use templates::{MailTemplates, RenderedMail};

#[cfg(test)]
pub use sender::mock::{RecordingMailSender, SentMail};

use crate::config::{MailConfig, MailTransport};
use crate::domain::DomainError;

/// Build the sender selected by `mail.transport`
pub fn create_mail_sender(config: &MailConfig) -> Result<Arc<dyn MailSender>, DomainError> {
    match config.transport {
        MailTransport::Log => Ok(Arc::new(LogMailSender::new())),
        MailTransport::Smtp => Ok(Arc::new(SmtpMailSender::new(&config.from, &config.smtp)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_log_sender() {
        let sender = create_mail_sender(&MailConfig::default()).unwrap();
        assert!(format!("{:?}", sender).contains("LogMailSender"));
    }

    #[test]
    fn test_create_smtp_sender_with_bad_from() {
        let config = MailConfig {
            transport: MailTransport::Smtp,
            from: "not a mailbox".to_string(),
            ..MailConfig::default()
        };
        assert!(matches!(
            create_mail_sender(&config),
            Err(DomainError::Configuration { .. })
        ));
    }
}
