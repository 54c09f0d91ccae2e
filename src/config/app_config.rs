use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Record store settings. Without a URL accounts live in memory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Credential and token settings handed to the account core
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Random bytes per login/reset token, before base64 encoding
    pub token_length: usize,
    /// Minimum display name length accepted at signup
    pub name_length_min: usize,
    pub password_hash: PasswordHashConfig,
    pub api_token: ApiTokenConfig,
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

/// Signed API token settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiTokenConfig {
    /// HS256 signing secret; a random one is generated at start-up when unset
    pub secret: Option<String>,
    pub expire_seconds: u64,
}

impl std::fmt::Debug for ApiTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[hidden]"))
            .field("expire_seconds", &self.expire_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write mails to the log instead of delivering them
    #[default]
    Log,
    Smtp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub from: String,
    /// Page that accepts `token` and `email` query parameters
    pub reset_url: String,
    pub welcome_mail: MailTemplateConfig,
    pub reset_mail: MailTemplateConfig,
    pub smtp: SmtpConfig,
}

/// Subject and body of one mail; `##URL##` and `##NAME##` are substituted
#[derive(Debug, Clone, Deserialize)]
pub struct MailTemplateConfig {
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[hidden]")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_length: 32,
            name_length_min: 1,
            password_hash: PasswordHashConfig::default(),
            api_token: ApiTokenConfig::default(),
        }
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        // argon2 crate defaults (19 MiB, 2 passes)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
        }
    }
}

impl Default for ApiTokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            expire_seconds: 60 * 60 * 24,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            from: "Accounts <noreply@localhost>".to_string(),
            reset_url: "http://localhost:8080/reset".to_string(),
            welcome_mail: MailTemplateConfig {
                subject: "Welcome".to_string(),
                body: "Please confirm your email: ##URL##".to_string(),
            },
            reset_mail: MailTemplateConfig {
                subject: "Forgot your password?".to_string(),
                body: "You can change your password here: ##URL##".to_string(),
            },
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
