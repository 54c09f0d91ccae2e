//! Account endpoint handlers

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::middleware::BasicCredentials;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::AccountId;
use crate::infrastructure::account::{
    AccountProfile, LoginResult, SignupRequest, UpdateAccountRequest,
};

const OK: &str = "ok";

/// Signup body; unknown fields go to the account extension
#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: AccountId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id: AccountId,
    pub login_token: String,
    pub api_token: String,
}

impl From<LoginResult> for TokenResponse {
    fn from(result: LoginResult) -> Self {
        Self {
            id: result.id,
            login_token: result.login_token,
            api_token: result.api_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: AccountId,
    pub email: String,
    pub name: Option<String>,
    /// Milliseconds since the Unix epoch
    pub created_on: i64,
}

impl From<AccountProfile> for ProfileResponse {
    fn from(profile: AccountProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            created_on: profile.created_at.timestamp_millis(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Current password
    pub password: Option<String>,
    #[serde(alias = "newpassword")]
    pub new_password: Option<String>,
}

impl From<UpdateBody> for UpdateAccountRequest {
    fn from(body: UpdateBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            password: body.password,
            new_password: body.new_password,
        }
    }
}

/// POST /v1/user
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<Json<SignupResponse>, ApiError> {
    debug!("Signup request");

    let account = state
        .account_service
        .signup(SignupRequest {
            email: body.email,
            name: body.name,
            extra: body.extra,
        })
        .await?;

    Ok(Json(SignupResponse { id: *account.id() }))
}

/// GET /v1/user/login
pub async fn login(
    State(state): State<AppState>,
    credentials: BasicCredentials,
) -> Result<Json<TokenResponse>, ApiError> {
    let result = state
        .account_service
        .login(&credentials.email, &credentials.secret)
        .await?;

    Ok(Json(result.into()))
}

/// GET /v1/user/apiToken
pub async fn api_token(
    State(state): State<AppState>,
    credentials: BasicCredentials,
) -> Result<Json<String>, ApiError> {
    let token = state
        .account_service
        .api_token(&credentials.email, &credentials.secret)
        .await?;

    Ok(Json(token))
}

/// GET /v1/user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credentials: BasicCredentials,
) -> Result<Json<ProfileResponse>, ApiError> {
    debug!(account_id = %id, "Getting account");

    let profile = state
        .account_service
        .get_profile(&id, &credentials.email, &credentials.secret)
        .await?;

    Ok(Json(profile.into()))
}

/// PUT /v1/user/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credentials: BasicCredentials,
    Json(body): Json<UpdateBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    debug!(account_id = %id, "Updating account");

    let result = state
        .account_service
        .update(&id, &credentials.email, &credentials.secret, body.into())
        .await?;

    Ok(Json(result.into()))
}

/// DELETE /v1/user/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    credentials: BasicCredentials,
) -> Result<Json<&'static str>, ApiError> {
    debug!(account_id = %id, "Deleting account");

    state
        .account_service
        .delete(&id, &credentials.email, &credentials.secret)
        .await?;

    Ok(Json(OK))
}

/// POST /v1/user/{email}/reset
pub async fn reset_password(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<&'static str>, ApiError> {
    state.account_service.request_reset(&email).await?;
    Ok(Json(OK))
}
