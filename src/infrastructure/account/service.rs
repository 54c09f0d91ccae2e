//! Account service - signup, login, reset and profile operations
//!
//! Every operation loads the account, runs the credential check, mutates the
//! in-memory snapshot and writes it back at most once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::domain::account::{
    find_by_email, normalize_email, validate_email, validate_name, validate_password,
    verify_password, verify_token, AccountExtension, AccountRepository, NoExtension,
    PasswordHasher, TokenSource,
};
use crate::domain::{Account, AccountId, CredentialMatch, DomainError, VerifiedAccount};
use crate::infrastructure::auth::ApiTokenIssuer;
use crate::infrastructure::mail::{MailSender, MailTemplates, RenderedMail};

use super::password::Argon2Hasher;
use super::token::TokenGenerator;

/// Request for creating a new account
#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub email: String,
    pub name: Option<String>,
    /// Fields beyond `email` and `name`, handed to the account extension
    pub extra: Map<String, Value>,
}

/// Request for changing an account.
///
/// `password` is the current password, only needed for a password change
/// authorized by the login token.
#[derive(Clone, Default)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub new_password: Option<String>,
}

impl UpdateAccountRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.new_password.is_none()
    }
}

impl std::fmt::Debug for UpdateAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateAccountRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[hidden]"))
            .field("new_password", &self.new_password.as_ref().map(|_| "[hidden]"))
            .finish()
    }
}

/// Credentials handed back after a login or an update
#[derive(Clone)]
pub struct LoginResult {
    pub id: AccountId,
    pub login_token: String,
    pub api_token: String,
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("id", &self.id)
            .field("login_token", &"[hidden]")
            .field("api_token", &"[hidden]")
            .finish()
    }
}

/// The public part of an account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountProfile {
    pub id: AccountId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: *account.id(),
            email: account.email().to_string(),
            name: account.name().map(str::to_string),
            created_at: account.created_at(),
        }
    }
}

/// Account service for authentication and account management
#[derive(Debug)]
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    mailer: Arc<dyn MailSender>,
    templates: MailTemplates,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenSource>,
    api_tokens: ApiTokenIssuer,
    extension: Arc<dyn AccountExtension>,
    name_length_min: usize,
}

impl AccountService {
    /// Create a new account service from the auth settings
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        mailer: Arc<dyn MailSender>,
        templates: MailTemplates,
        config: &AuthConfig,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            repository,
            mailer,
            templates,
            hasher: Arc::new(Argon2Hasher::from_config(&config.password_hash)?),
            tokens: Arc::new(TokenGenerator::new(config.token_length)),
            api_tokens: ApiTokenIssuer::new(&config.api_token)?,
            extension: Arc::new(NoExtension),
            name_length_min: config.name_length_min,
        })
    }

    /// Install a deployment-specific account extension
    pub fn with_extension(mut self, extension: Arc<dyn AccountExtension>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn api_tokens(&self) -> &ApiTokenIssuer {
        &self.api_tokens
    }

    /// Create an account and send the welcome mail.
    ///
    /// The account starts without a password; the welcome link carries a
    /// reset token with which the owner sets one.
    pub async fn signup(&self, request: SignupRequest) -> Result<Account, DomainError> {
        let email = normalize_email(&request.email);
        validate_email(&email).map_err(|e| DomainError::bad_request(e.to_string()))?;

        if let Some(name) = &request.name {
            validate_name(name, self.name_length_min)
                .map_err(|e| DomainError::bad_request(e.to_string()))?;
        }

        let extra = self.extension.validate_extra_fields(&request.extra)?;

        let mut account = Account::new(&email, request.name)
            .map_err(|e| DomainError::bad_request(e.to_string()))?;
        account.set_extra(extra);
        account.gen_login_token(self.tokens.as_ref())?;
        account.gen_reset_token(self.tokens.as_ref())?;

        let account = self.repository.create(account).await?;
        info!(account_id = %account.id(), "Account created");

        let mail = self.templates.welcome(&account)?;
        self.send(&account, mail).await?;

        Ok(account)
    }

    /// Exchange email and password for the login token and a fresh API token
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        let account = self.load_for_auth(email).await?;

        let verified = verify_password(account, password, self.hasher.as_ref())
            .inspect_err(|_| warn!("Password authentication failed"))?;

        debug!(account_id = %verified.account().id(), "Password login");
        self.login_result(verified.account())
    }

    /// Sign a fresh API token for a token-authenticated account
    pub async fn api_token(&self, email: &str, token: &str) -> Result<String, DomainError> {
        let verified = self.authenticate_token(email, token).await?;
        let account = self.settle(verified).await?;

        self.api_tokens.issue(&account, self.extension.as_ref())
    }

    /// Public profile of the authenticated account
    pub async fn get_profile(
        &self,
        id: &str,
        email: &str,
        token: &str,
    ) -> Result<AccountProfile, DomainError> {
        let verified = self.authenticate_token(email, token).await?;
        let account = self.settle(verified).await?;
        check_id(id, &account)?;

        Ok(AccountProfile::from(&account))
    }

    /// Change name, email or password.
    ///
    /// A reset token spent on this request stays spent, even when the update
    /// itself is rejected.
    pub async fn update(
        &self,
        id: &str,
        email: &str,
        token: &str,
        request: UpdateAccountRequest,
    ) -> Result<LoginResult, DomainError> {
        let verified = self.authenticate_token(email, token).await?;
        let consumed = verified
            .reset_consumed()
            .then(|| verified.account().clone());

        match self.apply_update(id, verified, request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if let Some(account) = consumed {
                    self.repository.update(&account).await?;
                    debug!(account_id = %account.id(), "Reset token spent on a rejected update");
                }
                Err(e)
            }
        }
    }

    /// Soft-delete the account. Only the password is accepted here.
    pub async fn delete(&self, id: &str, email: &str, password: &str) -> Result<(), DomainError> {
        let account = self.load_for_auth(email).await?;

        let verified = verify_password(account, password, self.hasher.as_ref())
            .inspect_err(|_| warn!("Password authentication failed"))?;

        let mut account = verified.into_account();
        check_id(id, &account)?;

        account.mark_deleted();
        self.repository.update(&account).await?;

        info!(account_id = %account.id(), "Account deleted");
        Ok(())
    }

    /// Issue a new reset token and mail it.
    ///
    /// The token is stored only after the mail went out, so a failed delivery
    /// leaves the previous reset link working. Succeeds without sending
    /// anything when no live account has this email.
    pub async fn request_reset(&self, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);

        let mut account = match self.repository.get_by_email(&email).await? {
            Some(account) => account,
            None => {
                debug!("Reset requested for an unknown email");
                return Ok(());
            }
        };

        account.gen_reset_token(self.tokens.as_ref())?;
        let mail = self.templates.reset(&account)?;
        self.send(&account, mail).await?;

        self.repository.update(&account).await?;
        info!(account_id = %account.id(), "Reset token issued");
        Ok(())
    }

    async fn apply_update(
        &self,
        id: &str,
        mut verified: VerifiedAccount,
        request: UpdateAccountRequest,
    ) -> Result<LoginResult, DomainError> {
        check_id(id, verified.account())?;

        match verified.matched() {
            CredentialMatch::ResetToken => {
                if request.new_password.is_none() {
                    return Err(DomainError::bad_request("password required"));
                }
            }
            CredentialMatch::LoginToken => {
                if request.is_empty() {
                    return Err(DomainError::bad_request("nothing to update"));
                }
                if request.new_password.is_some() {
                    let current = request.password.as_deref().unwrap_or_default();
                    let matches = verified
                        .account()
                        .password_hash()
                        .is_some_and(|hash| !current.is_empty() && self.hasher.verify(current, hash));

                    if !matches {
                        warn!(account_id = %verified.account().id(), "Current password rejected");
                        return Err(DomainError::unauthorized("Unauthorized"));
                    }
                }
            }
            CredentialMatch::Password => {
                return Err(DomainError::fatal("update authorized by password"));
            }
        }

        if let Some(name) = &request.name {
            validate_name(name, self.name_length_min)
                .map_err(|e| DomainError::bad_request(e.to_string()))?;
        }

        let new_email = match &request.email {
            Some(email) => {
                let email = normalize_email(email);
                validate_email(&email).map_err(|e| DomainError::bad_request(e.to_string()))?;
                (email != verified.account().email()).then_some(email)
            }
            None => None,
        };

        if let Some(email) = &new_email {
            if self.repository.email_taken(email).await? {
                return Err(DomainError::conflict("email exists already"));
            }
        }

        let password_hash = match &request.new_password {
            Some(password) => {
                validate_password(password).map_err(|e| DomainError::bad_request(e.to_string()))?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        let account = verified.account_mut();

        if let Some(name) = request.name {
            account.set_name(name.trim());
        }

        if let Some(email) = new_email {
            account
                .set_email(&email)
                .map_err(|e| DomainError::bad_request(e.to_string()))?;
        }

        if let Some(hash) = password_hash {
            account.set_password_hash(hash);
            account.gen_login_token(self.tokens.as_ref())?;
            account.clear_reset_token();
        }

        let account = self.repository.update(account).await?;
        info!(account_id = %account.id(), "Account updated");

        self.login_result(&account)
    }

    /// Look up a live account for a credential check.
    ///
    /// An unknown email is reported as `Unauthorized`.
    async fn load_for_auth(&self, email: &str) -> Result<Account, DomainError> {
        find_by_email(self.repository.as_ref(), &normalize_email(email))
            .await
            .map_err(DomainError::not_found_as_unauthorized)
    }

    async fn authenticate_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<VerifiedAccount, DomainError> {
        let account = self.load_for_auth(email).await?;

        verify_token(account, token).inspect_err(|_| warn!("Token authentication failed"))
    }

    /// Persist a spent reset token before anything else happens
    async fn settle(&self, verified: VerifiedAccount) -> Result<Account, DomainError> {
        if verified.reset_consumed() {
            debug!(account_id = %verified.account().id(), "Reset token spent");
            return self.repository.update(verified.account()).await;
        }

        Ok(verified.into_account())
    }

    fn login_result(&self, account: &Account) -> Result<LoginResult, DomainError> {
        let login_token = account
            .login_token()
            .ok_or_else(|| DomainError::fatal(format!("account '{}' has no login token", account.id())))?
            .to_string();

        Ok(LoginResult {
            id: *account.id(),
            login_token,
            api_token: self.api_tokens.issue(account, self.extension.as_ref())?,
        })
    }

    async fn send(&self, account: &Account, mail: RenderedMail) -> Result<(), DomainError> {
        self.mailer
            .send(account.email(), &mail.body, &mail.subject)
            .await
    }
}

/// The id in the request path must name the authenticated account
fn check_id(id: &str, account: &Account) -> Result<(), DomainError> {
    match AccountId::parse(id) {
        Ok(id) if &id == account.id() => Ok(()),
        _ => Err(DomainError::unauthorized("Unauthorized")),
    }
}
