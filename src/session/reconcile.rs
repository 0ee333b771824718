//! Reconciling the session with wallet-originated events

use super::{ConnectionStatus, WalletSession};
use crate::events::{EventBus, WalletEvent};
use crate::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

impl WalletSession {
    /// Apply one wallet event to the session
    pub async fn handle_event(&self, event: WalletEvent) {
        tracing::info!(event = event.name(), "StarKey event");
        match event {
            WalletEvent::ExtensionInstalled => {
                let interval = self.inner.config.reinstall_poll_interval();
                self.detect_with_interval(interval).await;
            }
            WalletEvent::WalletUpdated => {
                self.handle_account_switch().await;
                self.set_loading(false).await;
            }
            WalletEvent::WalletDisconnected => {
                self.bump_epoch();
                self.reset_wallet_data().await;
                self.navigate_home();
            }
            WalletEvent::WindowRemoved => {
                self.set_loading(false).await;
            }
        }
    }

    /// The wallet's active account changed
    ///
    /// Logs out the previous account if the backend still has a session,
    /// then logs in as the new active account, or clears the session when
    /// the wallet has none left.
    async fn handle_account_switch(&self) {
        let epoch = self.bump_epoch();
        let Some(provider) = self.provider() else {
            tracing::debug!("Account switch without a provider");
            return;
        };

        let backend = &self.inner.backend;
        match backend.check_session().await {
            Ok(true) => {
                tracing::info!("Removing session cookie for previous account");
                if let Err(e) = backend.logout().await {
                    tracing::warn!(error = %e, "Logout of previous account failed");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Auth check failed during account switch"),
        }

        let accounts = match provider.account().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read wallet accounts");
                Vec::new()
            }
        };

        let Some(account) = accounts.first().cloned() else {
            self.reset_wallet_data().await;
            self.navigate_home();
            return;
        };

        self.set_accounts(accounts).await;
        self.set_status(ConnectionStatus::Authenticating).await;
        self.register_account_detached(&account);

        let message = self.inner.config.messages.account_switch.clone();
        match self
            .login(provider.as_ref(), &account, &message, epoch, false)
            .await
        {
            Ok(()) => {
                tracing::info!(account = %account, "Switched account");
                self.update_accounts().await;
            }
            Err(Error::Superseded) => {}
            Err(e) => {
                tracing::error!(account = %account, error = %e, "Account switch auth error");
                self.set_status(ConnectionStatus::Disconnected).await;
                self.toast("Authentication Failed", "Failed to authenticate new account");
            }
        }
    }

    /// Consume wallet events from the bus until it closes
    pub fn spawn_event_listener(&self, bus: &EventBus) -> JoinHandle<()> {
        let session = self.clone();
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Wallet event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Wallet event listener stopped");
        })
    }
}
