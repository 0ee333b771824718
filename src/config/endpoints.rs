//! Backend endpoint configuration
//!
//! The backend is addressed by one base URL plus a fixed table of paths.
//! Resolution follows the usual order:
//! 1. `STARKEY_BACKEND_URL` env var - highest priority
//! 2. Explicit base URL from the config file
//! 3. Local development fallback
//!
//! # Examples
//!
//! ```bash
//! export STARKEY_BACKEND_URL="https://app.example.com"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable names
pub(crate) mod env_vars {
    pub const BACKEND_URL: &str = "STARKEY_BACKEND_URL";
}

/// Local development backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Default paths served by the backend
mod paths {
    pub const NONCE: &str = "/api/auth/nonce";
    pub const AUTHENTICATE: &str = "/api/auth";
    pub const AUTH_CHECK: &str = "/api/auth/check";
    pub const SESSION_LOGIN: &str = "/api/starkey/login";
    pub const SESSION_LOGOUT: &str = "/api/starkey/logout";
    pub const ACCOUNT_LOGIN: &str = "/api/account/login";
    pub const ACCOUNT_LIKES: &str = "/api/account/likes";
}

/// Paths of every backend endpoint the session manager talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendEndpoints {
    /// Base URL, e.g. `https://app.example.com`
    pub base_url: String,
    /// `GET` -> nonce text
    pub nonce: String,
    /// `POST {address, signature, nonce}` -> `{token}`
    pub authenticate: String,
    /// `GET` -> 2xx when the session cookie is valid
    pub auth_check: String,
    /// `POST {token}` -> sets the HTTP-only cookie
    pub session_login: String,
    /// `POST` -> clears the cookie
    pub session_logout: String,
    /// `POST {walletAddress}` -> account registration
    pub account_login: String,
    /// `POST {boxId}` -> authenticated like
    pub account_likes: String,
}

impl BackendEndpoints {
    /// Endpoint table rooted at an explicit base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            nonce: paths::NONCE.to_string(),
            authenticate: paths::AUTHENTICATE.to_string(),
            auth_check: paths::AUTH_CHECK.to_string(),
            session_login: paths::SESSION_LOGIN.to_string(),
            session_logout: paths::SESSION_LOGOUT.to_string(),
            account_login: paths::ACCOUNT_LOGIN.to_string(),
            account_likes: paths::ACCOUNT_LIKES.to_string(),
        }
    }

    /// Endpoint table from `STARKEY_BACKEND_URL`, falling back to localhost
    pub fn from_env() -> Self {
        match std::env::var(env_vars::BACKEND_URL) {
            Ok(url) => {
                tracing::debug!("Using STARKEY_BACKEND_URL for backend");
                Self::with_base_url(url)
            }
            Err(_) => {
                tracing::warn!(
                    url = DEFAULT_BACKEND_URL,
                    "No backend configured, using local development URL"
                );
                Self::with_base_url(DEFAULT_BACKEND_URL)
            }
        }
    }

    /// Resolve a path against the base URL
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let base: Url = self
            .base_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid backend URL {}: {}", self.base_url, e)))?;
        base.join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint path {}: {}", path, e)))
    }
}

impl Default for BackendEndpoints {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BACKEND_URL)
    }
}
