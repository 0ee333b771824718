//! Authentication backend abstraction
//!
//! The backend issues nonces, verifies signatures, and owns the HTTP-only
//! session cookie. This crate only drives it:
//! - `HttpBackend` talks to the real endpoints with a cookie store
//! - tests substitute an in-memory implementation
//!
//! Token verification never happens client-side.

mod http;

pub use http::HttpBackend;

use crate::Result;
use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-issued single-use challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthNonce(String);

impl AuthNonce {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer token returned for a verified signature
///
/// Only ever forwarded to the cookie endpoint; never logged.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Body of `POST /api/auth`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub address: String,
    pub signature: String,
    pub nonce: AuthNonce,
}

/// Arbitrary request sent with session credentials
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Status and decoded body of a credentialed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub status: u16,
    /// JSON body, a JSON string for non-JSON text, or null when empty
    pub body: Value,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Backend endpoints used by the session manager
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /api/auth/nonce`
    async fn fetch_nonce(&self) -> Result<AuthNonce>;

    /// `POST /api/auth` -> token
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthToken>;

    /// `POST /api/starkey/login` -> HTTP-only cookie
    async fn store_session(&self, token: &AuthToken) -> Result<()>;

    /// `POST /api/starkey/logout`
    async fn logout(&self) -> Result<()>;

    /// `GET /api/auth/check`; `Ok(false)` for any non-2xx status
    async fn check_session(&self) -> Result<bool>;

    /// `POST /api/account/login`, fire-and-forget by callers
    async fn register_account(&self, address: &str) -> Result<()>;

    /// Send any request with session credentials
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_request_wire_format() {
        let request = AuthRequest {
            address: "0xabc".to_string(),
            signature: "0xsig".to_string(),
            nonce: AuthNonce::new("n-1"),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "address": "0xabc", "signature": "0xsig", "nonce": "n-1" })
        );
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{:?}", token), "AuthToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }

    #[test]
    fn response_success_range() {
        let ok = BackendResponse {
            status: 204,
            body: Value::Null,
        };
        let denied = BackendResponse {
            status: 401,
            body: Value::Null,
        };
        assert!(ok.is_success());
        assert!(!denied.is_success());
    }
}
