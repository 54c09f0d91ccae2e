//! v1 API endpoints

pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/user", post(users::signup))
        .route("/user/login", get(users::login))
        .route("/user/apiToken", get(users::api_token))
        // Same capture name on both routes: an account id, or an email for reset
        .route(
            "/user/{account}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/user/{account}/reset", post(users::reset_password))
}
