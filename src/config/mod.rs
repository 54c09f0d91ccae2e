//! Configuration loading

mod app_config;

pub use app_config::{
    ApiTokenConfig, AppConfig, AuthConfig, DatabaseConfig, LogFormat, LoggingConfig,
    MailConfig, MailTemplateConfig, MailTransport, PasswordHashConfig, ServerConfig, SmtpConfig,
};
