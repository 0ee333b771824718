//! Connect, login and session revalidation

use super::{ConnectionStatus, WalletSession};
use crate::backend::{AuthRequest, BackendRequest, BackendResponse};
use crate::events::SessionNotice;
use crate::provider::{SignMessageRequest, WalletProvider};
use crate::signing::{encode_message, SignedMessage};
use crate::{Error, Result};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

impl WalletSession {
    /// Connect the wallet and log in with a signed nonce
    ///
    /// Returns the active account. Every failure is also reported to the
    /// user as a toast.
    pub async fn connect_wallet(&self) -> Result<String> {
        let Some(provider) = self.provider() else {
            self.toast(
                "Extension not installed",
                "Please install the Starkey extension",
            );
            return Err(Error::ExtensionNotInstalled);
        };

        self.set_loading(true).await;
        self.set_status(ConnectionStatus::Connecting).await;
        let result = self.connect_with(provider).await;
        self.set_loading(false).await;

        match result {
            Ok(account) => {
                tracing::info!(account = %account, "Wallet connected");
                Ok(account)
            }
            Err(e) => {
                tracing::error!(error = %e, "Connect error");
                if e.is_user_facing() {
                    self.set_status(ConnectionStatus::Disconnected).await;
                    self.toast("Connection Failed", "Failed to connect wallet");
                }
                Err(e)
            }
        }
    }

    async fn connect_with(&self, provider: Arc<dyn WalletProvider>) -> Result<String> {
        let epoch = self.bump_epoch();

        provider.connect().await?;
        self.update_accounts().await;

        let accounts = provider.account().await?;
        let account = accounts
            .first()
            .cloned()
            .ok_or_else(|| Error::Provider("Wallet returned no accounts".to_string()))?;
        self.set_accounts(accounts).await;
        self.register_account_detached(&account);

        self.ensure_required_chain().await?;

        self.set_status(ConnectionStatus::Authenticating).await;
        let message = self.inner.config.messages.connect.clone();
        self.login(provider.as_ref(), &account, &message, epoch, true)
            .await?;
        Ok(account)
    }

    /// Nonce, signature, token exchange, cookie
    ///
    /// Drops the result with `Error::Superseded` when the epoch moved while
    /// the wallet or backend was being awaited.
    pub(super) async fn login(
        &self,
        provider: &dyn WalletProvider,
        account: &str,
        message: &str,
        epoch: u64,
        force_sign: bool,
    ) -> Result<()> {
        let backend = &self.inner.backend;

        let nonce = backend.fetch_nonce().await?;
        let signed = self
            .sign_with(provider, message, nonce.as_str(), Some(account), force_sign)
            .await?
            .ok_or_else(|| {
                Error::Authentication("A signature request is already pending".to_string())
            })?;

        let token = backend
            .authenticate(&AuthRequest {
                address: account.to_string(),
                signature: signed.signature,
                nonce,
            })
            .await?;

        if self.current_epoch() != epoch {
            tracing::warn!(account = %account, "Discarding superseded login");
            return Err(Error::Superseded);
        }

        backend.store_session(&token).await?;
        self.set_status(ConnectionStatus::Connected).await;
        self.notify(SessionNotice::Connected {
            account: account.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Register the account with the backend without waiting for it
    pub(super) fn register_account_detached(&self, account: &str) {
        let backend = self.inner.backend.clone();
        let account = account.to_string();
        tokio::spawn(async move {
            if let Err(e) = backend.register_account(&account).await {
                tracing::warn!(account = %account, error = %e, "Account registration failed");
            }
        });
    }

    /// Disconnect the wallet and clear the session
    ///
    /// Never fails: provider and backend errors are logged and local state
    /// is cleared regardless.
    pub async fn disconnect_wallet(&self) {
        self.bump_epoch();
        self.set_status(ConnectionStatus::Disconnecting).await;

        if let Some(provider) = self.provider() {
            if let Err(e) = provider.disconnect().await {
                tracing::warn!(error = %e, "Wallet disconnect failed, clearing session anyway");
            }
        }

        tracing::info!("Removing session cookie");
        if let Err(e) = self.inner.backend.logout().await {
            tracing::warn!(error = %e, "Backend logout failed");
        }

        self.reset_wallet_data().await;
        self.navigate_home();
    }

    /// Ask the wallet to sign `message` with `nonce`
    ///
    /// Returns `Ok(None)` when there is no provider, no account to sign
    /// with, or another signature is pending and `force` is false. An
    /// explicit `account` allows signing on an empty session without
    /// adding it to the session's accounts.
    pub async fn sign_message(
        &self,
        message: &str,
        nonce: &str,
        account: Option<&str>,
        force: bool,
    ) -> Result<Option<SignedMessage>> {
        let Some(provider) = self.provider() else {
            return Ok(None);
        };
        self.sign_with(provider.as_ref(), message, nonce, account, force)
            .await
    }

    async fn sign_with(
        &self,
        provider: &dyn WalletProvider,
        message: &str,
        nonce: &str,
        account: Option<&str>,
        force: bool,
    ) -> Result<Option<SignedMessage>> {
        // An explicit account only stands in for this call; session
        // accounts change through the account refresh alone
        if account.is_none() && self.inner.state.read().await.accounts.is_empty() {
            return Ok(None);
        }

        let permit = self.inner.sign_flight.try_start();
        if permit.is_none() && !force {
            return Ok(None);
        }

        tracing::debug!(nonce = %nonce, "Requesting wallet signature");
        let response = provider
            .sign_message(&SignMessageRequest {
                message: encode_message(message),
                nonce: nonce.to_string(),
            })
            .await?;

        Ok(Some(SignedMessage::from_response(message, response)))
    }

    /// Sign in again with the active account
    pub async fn sign_in(&self) -> Result<()> {
        let provider = self.provider().ok_or(Error::ExtensionNotInstalled)?;
        let account = self.active_account().await.ok_or(Error::NotConnected)?;
        let message = self.inner.config.messages.sign_in.clone();
        let epoch = self.current_epoch();
        self.login(provider.as_ref(), &account, &message, epoch, false)
            .await
    }

    /// Check the session cookie and re-authenticate once if it expired
    ///
    /// Returns false when the session is invalid and could not be renewed,
    /// including when another re-authentication is already in flight. The
    /// cookie check always runs; only the renewal is single-flight.
    pub async fn check_and_revalidate_token(&self) -> bool {
        match self.inner.backend.check_session().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "Token validation error");
                return false;
            }
        }

        let Some(provider) = self.provider() else {
            return false;
        };
        let Some(account) = self.active_account().await else {
            return false;
        };
        let Some(_permit) = self.inner.reauth_flight.try_start() else {
            return false;
        };

        tracing::info!(account = %account, "Session expired, re-authenticating");
        let message = self.inner.config.messages.token_expiry.clone();
        let epoch = self.current_epoch();
        match self
            .login(provider.as_ref(), &account, &message, epoch, false)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Re-authentication failed");
                false
            }
        }
    }

    /// Send a credentialed request after making sure the session is valid
    pub async fn auth_fetch(&self, request: BackendRequest) -> Result<BackendResponse> {
        if !self.check_and_revalidate_token().await {
            return Err(Error::Authentication("Authentication failed".to_string()));
        }
        self.inner.backend.send(request).await
    }

    /// Like a box as the active account
    pub async fn like_box(&self, box_id: &str) -> Result<BackendResponse> {
        if self.inner.state.read().await.accounts.is_empty() {
            return Err(Error::NotConnected);
        }
        let path = self.inner.config.backend.account_likes.clone();
        self.auth_fetch(BackendRequest::post(path, json!({ "boxId": box_id })))
            .await
    }

    /// Revalidate the session every `revalidate_interval` while accounts exist
    pub fn spawn_revalidation(&self) -> JoinHandle<()> {
        let session = self.clone();
        let period = self.inner.config.revalidate_interval();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if session.accounts().await.is_empty() {
                    continue;
                }
                if !session.check_and_revalidate_token().await {
                    tracing::warn!("Periodic session revalidation failed");
                }
            }
        })
    }
}
