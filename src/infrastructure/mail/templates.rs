//! Welcome and password-reset mail templates

use url::Url;

use crate::config::{MailConfig, MailTemplateConfig};
use crate::domain::{Account, DomainError};

const URL_PLACEHOLDER: &str = "##URL##";
const NAME_PLACEHOLDER: &str = "##NAME##";

/// A rendered mail, ready for a [`super::MailSender`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMail {
    pub subject: String,
    pub body: String,
}

/// Renders the mails that carry a reset token link
#[derive(Debug, Clone)]
pub struct MailTemplates {
    reset_url: Url,
    welcome: MailTemplateConfig,
    reset: MailTemplateConfig,
}

impl MailTemplates {
    pub fn new(config: &MailConfig) -> Result<Self, DomainError> {
        let reset_url = Url::parse(&config.reset_url).map_err(|e| {
            DomainError::configuration(format!("Invalid reset_url '{}': {}", config.reset_url, e))
        })?;

        Ok(Self {
            reset_url,
            welcome: config.welcome_mail.clone(),
            reset: config.reset_mail.clone(),
        })
    }

    /// Mail sent at signup; the link doubles as email verification
    pub fn welcome(&self, account: &Account) -> Result<RenderedMail, DomainError> {
        let link = self.reset_link(account, true)?;
        Ok(render(&self.welcome, account, &link))
    }

    /// Mail sent when a password reset is requested
    pub fn reset(&self, account: &Account) -> Result<RenderedMail, DomainError> {
        let link = self.reset_link(account, false)?;
        Ok(render(&self.reset, account, &link))
    }

    fn reset_link(&self, account: &Account, welcome: bool) -> Result<String, DomainError> {
        let token = account.reset_token().ok_or_else(|| {
            DomainError::fatal(format!("account '{}' has no reset token to mail", account.id()))
        })?;

        let mut url = self.reset_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", token);
            query.append_pair("email", account.email());
            if welcome {
                query.append_pair("welcome", "true");
            }
        }

        Ok(url.to_string())
    }
}

fn render(template: &MailTemplateConfig, account: &Account, link: &str) -> RenderedMail {
    let name = account.name().unwrap_or(account.email());

    RenderedMail {
        subject: template.subject.replace(NAME_PLACEHOLDER, name),
        body: template
            .body
            .replace(URL_PLACEHOLDER, link)
            .replace(NAME_PLACEHOLDER, name),
    }
}
