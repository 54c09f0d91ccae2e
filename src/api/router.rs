use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::health;
use super::middleware::security_headers_middleware;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Account API
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use url::Url;

    use crate::config::{ApiTokenConfig, AuthConfig, MailConfig};
    use crate::infrastructure::account::{AccountService, Argon2Hasher, InMemoryAccountRepository};
    use crate::infrastructure::mail::{MailTemplates, RecordingMailSender};

    struct TestApp {
        router: Router,
        mailer: Arc<RecordingMailSender>,
    }

    fn test_app() -> TestApp {
        let mailer = Arc::new(RecordingMailSender::new());
        let service = AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            mailer.clone(),
            MailTemplates::new(&MailConfig::default()).unwrap(),
            &AuthConfig {
                api_token: ApiTokenConfig {
                    secret: Some("router-test-secret".to_string()),
                    ..ApiTokenConfig::default()
                },
                ..AuthConfig::default()
            },
        )
        .unwrap()
        .with_hasher(Arc::new(Argon2Hasher::with_params(8, 1).unwrap()));

        TestApp {
            router: create_router(AppState::new(Arc::new(service))),
            mailer,
        }
    }

    fn basic(email: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", email, secret)))
    }

    async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        auth: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    /// The reset token embedded in the link of the latest mail
    async fn token_from_last_mail(app: &TestApp) -> String {
        let mails = app.mailer.sent().await;
        let body = &mails.last().unwrap().body;
        let link = body.split_whitespace().find(|w| w.starts_with("http")).unwrap();

        Url::parse(link)
            .unwrap()
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "account_store");

        let (status, _) = send(&app, Method::GET, "/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let app = test_app();
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_signup_reset_login_password_change() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/user",
            None,
            Some(json!({ "email": "a@b.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();

        let welcome = app.mailer.sent().await;
        assert_eq!(welcome.len(), 1);
        assert!(welcome[0].body.contains("welcome=true"));
        let reset = token_from_last_mail(&app).await;

        // Set the first password with the welcome token
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &reset)),
            Some(json!({ "newPassword": "a12345678" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, login) = send(
            &app,
            Method::GET,
            "/v1/user/login",
            Some(basic("A@B.com", "a12345678")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["id"], id.as_str());
        assert!(login["apiToken"].is_string());
        let old_token = login["loginToken"].as_str().unwrap().to_string();

        let (status, changed) = send(
            &app,
            Method::PUT,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &old_token)),
            Some(json!({ "password": "a12345678", "newPassword": "b12345678" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let new_token = changed["loginToken"].as_str().unwrap().to_string();
        assert_ne!(new_token, old_token);

        let (status, _) = send(
            &app,
            Method::GET,
            "/v1/user/apiToken",
            Some(basic("a@b.com", &old_token)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, api_token) = send(
            &app,
            Method::GET,
            "/v1/user/apiToken",
            Some(basic("a@b.com", &new_token)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(api_token.is_string());

        let (status, profile) = send(
            &app,
            Method::GET,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &new_token)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "a@b.com");
        assert!(profile["createdOn"].is_i64());
    }

    #[tokio::test]
    async fn test_reset_request_never_reveals_accounts() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/user/nobody%40b.com/reset",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));
        assert!(app.mailer.sent().await.is_empty());

        send(
            &app,
            Method::POST,
            "/v1/user",
            None,
            Some(json!({ "email": "a@b.com" })),
        )
        .await;

        let (status, body) = send(&app, Method::POST, "/v1/user/A@b.com/reset", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));

        let mails = app.mailer.sent().await;
        assert_eq!(mails.len(), 2);
        assert_eq!(mails[1].address, "a@b.com");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/v1/user/login", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Authorization wrong");

        let (status, body) = send(
            &app,
            Method::GET,
            "/v1/user/login",
            Some(basic("nobody@b.com", "a12345678")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "User not found");
        assert_eq!(body["error"]["type"], "authentication_error");

        let signup = json!({ "email": "a@b.com" });
        let (status, _) = send(&app, Method::POST, "/v1/user", None, Some(signup)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/user",
            None,
            Some(json!({ "email": "A@b.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "User exists");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/user",
            None,
            Some(json!({ "email": "tester@test" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/v1/user", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_nothing_to_update_and_delete() {
        let app = test_app();

        let (_, body) = send(
            &app,
            Method::POST,
            "/v1/user",
            None,
            Some(json!({ "email": "a@b.com", "name": "Ann" })),
        )
        .await;
        let id = body["id"].as_str().unwrap().to_string();
        let reset = token_from_last_mail(&app).await;

        let (_, changed) = send(
            &app,
            Method::PUT,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &reset)),
            Some(json!({ "newpassword": "a12345678" })),
        )
        .await;
        let login_token = changed["loginToken"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &login_token)),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "nothing to update");

        // Deletion takes the password, never a token
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &login_token)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", "a12345678")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/v1/user/{}", id),
            Some(basic("a@b.com", &login_token)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::GET,
            "/v1/user/login",
            Some(basic("a@b.com", "a12345678")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
