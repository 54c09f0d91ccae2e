//! HTTP Basic credential extraction
//!
//! Every authenticated route takes `Authorization: Basic base64(email:secret)`.
//! The secret is a password or a token depending on the route; checking it is
//! the account service's job.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::api::types::ApiError;

const AUTHORIZATION_WRONG: &str = "Authorization wrong";

/// Email and secret from a Basic `Authorization` header
#[derive(Clone)]
pub struct BasicCredentials {
    pub email: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("email", &self.email)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BasicCredentials {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credentials = extract_basic_credentials(&parts.headers)?;
        debug!(email = %credentials.email, "Basic credentials presented");
        Ok(credentials)
    }
}

/// Decode the Basic credentials. Missing or empty parts are a bad request.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, ApiError> {
    let wrong = || ApiError::bad_request(AUTHORIZATION_WRONG);

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(wrong)?
        .to_str()
        .map_err(|_| wrong())?;

    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))
        .ok_or_else(wrong)?;

    let decoded = STANDARD.decode(encoded.trim()).map_err(|_| wrong())?;
    let decoded = String::from_utf8(decoded).map_err(|_| wrong())?;

    // Tokens are base64 and may hold ':' only after the first separator
    let (email, secret) = decoded.split_once(':').ok_or_else(wrong)?;

    if email.is_empty() || secret.is_empty() {
        return Err(wrong());
    }

    Ok(BasicCredentials {
        email: email.to_string(),
        secret: secret.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn basic(raw: &str) -> HeaderMap {
        headers(&format!("Basic {}", STANDARD.encode(raw)))
    }

    fn assert_wrong(result: Result<BasicCredentials, ApiError>) {
        let err = result.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.message, "Authorization wrong");
    }

    #[test]
    fn test_extract_basic_credentials() {
        let credentials = extract_basic_credentials(&basic("a@b.com:a12345678")).unwrap();
        assert_eq!(credentials.email, "a@b.com");
        assert_eq!(credentials.secret, "a12345678");
    }

    #[test]
    fn test_secret_may_contain_colon() {
        let credentials = extract_basic_credentials(&basic("a@b.com:pass:word")).unwrap();
        assert_eq!(credentials.secret, "pass:word");
    }

    #[test]
    fn test_missing_header() {
        assert_wrong(extract_basic_credentials(&HeaderMap::new()));
    }

    #[test]
    fn test_empty_parts() {
        assert_wrong(extract_basic_credentials(&basic(":a12345678")));
        assert_wrong(extract_basic_credentials(&basic("a@b.com:")));
        assert_wrong(extract_basic_credentials(&basic("a@b.com")));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_wrong(extract_basic_credentials(&headers("Bearer abc")));
        assert_wrong(extract_basic_credentials(&headers("Basic not-base64!")));
    }

    #[test]
    fn test_debug_hides_secret() {
        let credentials = extract_basic_credentials(&basic("a@b.com:a12345678")).unwrap();
        assert!(!format!("{:?}", credentials).contains("a12345678"));
    }
}
