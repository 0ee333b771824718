//! reqwest-backed [`AuthBackend`]
//!
//! The client keeps a cookie store, so the HTTP-only session cookie set by
//! the login endpoint is sent with every later request, like a browser
//! fetch with `credentials: "include"`.

use super::{AuthBackend, AuthNonce, AuthRequest, AuthToken, BackendRequest, BackendResponse};
use crate::config::BackendEndpoints;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

pub struct HttpBackend {
    client: Client,
    endpoints: BackendEndpoints,
}

impl HttpBackend {
    pub fn new(endpoints: BackendEndpoints) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &BackendEndpoints {
        &self.endpoints
    }

    /// Turn a non-2xx response into `Error::Backend`
    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Response> {
        let url = self.endpoints.resolve(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::ensure_success(response).await
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn fetch_nonce(&self) -> Result<AuthNonce> {
        let url = self.endpoints.resolve(&self.endpoints.nonce)?;
        let response = Self::ensure_success(self.client.get(url).send().await?).await?;
        let nonce = response.text().await?;
        tracing::debug!(nonce = %nonce, "Fetched auth nonce");
        Ok(AuthNonce::new(nonce))
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthToken> {
        let body = serde_json::to_value(request)?;
        let response = self
            .post_json(&self.endpoints.authenticate, &body)
            .await
            .map_err(|e| match e {
                Error::Backend { status, message } => {
                    Error::Authentication(format!("backend rejected signature ({status}): {message}"))
                }
                other => other,
            })?;
        let parsed: TokenResponse = response.json().await?;
        parsed
            .token
            .filter(|t| !t.is_empty())
            .map(AuthToken::new)
            .ok_or_else(|| Error::Authentication("No token in auth response".to_string()))
    }

    async fn store_session(&self, token: &AuthToken) -> Result<()> {
        self.post_json(
            &self.endpoints.session_login,
            &json!({ "token": token.expose() }),
        )
        .await?;
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let url = self.endpoints.resolve(&self.endpoints.session_logout)?;
        Self::ensure_success(self.client.post(url).send().await?).await?;
        Ok(())
    }

    async fn check_session(&self) -> Result<bool> {
        let url = self.endpoints.resolve(&self.endpoints.auth_check)?;
        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }

    async fn register_account(&self, address: &str) -> Result<()> {
        self.post_json(
            &self.endpoints.account_login,
            &json!({ "walletAddress": address }),
        )
        .await?;
        Ok(())
    }

    async fn send(&self, request: BackendRequest) -> Result<BackendResponse> {
        let url = self.endpoints.resolve(&request.path)?;
        let mut builder = self.client.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(BackendResponse { status, body })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
