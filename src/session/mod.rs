//! Wallet session manager
//!
//! [`WalletSession`] owns the client side of a StarKey login:
//! - finds the injected provider and tracks its accounts
//! - runs the nonce / signature / token exchange against the backend
//! - keeps the backend session alive and in step with the wallet
//!
//! The wallet is a separate trust boundary. It can switch accounts or
//! disconnect at any moment, so every session invariant is re-established
//! from [`WalletEvent`](crate::events::WalletEvent)s as well as from direct
//! calls.
//!
//! State is shared last-writer-wins between user calls and event handlers.
//! Login attempts are fenced by an epoch: anything that changes who is
//! logged in (disconnect, account switch, a newer connect) bumps it, and an
//! attempt that finds the epoch moved before committing is dropped.

mod auth;
mod guard;
mod reconcile;
mod state;
mod transactions;

pub use guard::SingleFlight;
pub use state::{ConnectionStatus, SessionState, TransactionRecord};
pub use transactions::parse_units;

use crate::backend::AuthBackend;
use crate::config::SessionConfig;
use crate::events::{Notification, SessionNotice};
use crate::provider::{wait_for_provider, NetworkData, ProviderLocator, WalletProvider};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

const NOTICE_CAPACITY: usize = 64;

struct Inner {
    config: SessionConfig,
    locator: Arc<dyn ProviderLocator>,
    provider: StdRwLock<Option<Arc<dyn WalletProvider>>>,
    installed: AtomicBool,
    backend: Arc<dyn AuthBackend>,
    state: RwLock<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    sign_flight: SingleFlight,
    reauth_flight: SingleFlight,
    epoch: AtomicU64,
}

/// Cheaply cloneable handle to one wallet session
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<Inner>,
}

impl WalletSession {
    pub fn new(
        config: SessionConfig,
        locator: Arc<dyn ProviderLocator>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                locator,
                provider: StdRwLock::new(None),
                installed: AtomicBool::new(false),
                backend,
                state: RwLock::new(SessionState::default()),
                notices,
                sign_flight: SingleFlight::new("sign_message"),
                reauth_flight: SingleFlight::new("reauthenticate"),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Subscribe to toasts, navigation requests and login notices
    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.inner.notices.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn accounts(&self) -> Vec<String> {
        self.inner.state.read().await.accounts.clone()
    }

    pub async fn active_account(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .await
            .active_account()
            .map(str::to_string)
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.state.read().await.status
    }

    pub fn is_extension_installed(&self) -> bool {
        self.inner.installed.load(Ordering::SeqCst)
    }

    /// The detected provider, if any
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.inner
            .provider
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_provider(&self, provider: Arc<dyn WalletProvider>) {
        tracing::info!(provider = provider.name(), "Wallet extension detected");
        *self
            .inner
            .provider
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(provider);
        self.inner.installed.store(true, Ordering::SeqCst);
    }

    /// Look for the extension and, once found, load its accounts
    ///
    /// Returns whether the extension is installed. Polls every
    /// `detect_interval` up to `detect_timeout`.
    pub async fn detect_extension(&self) -> bool {
        let interval = self.inner.config.detect_interval();
        self.detect_with_interval(interval).await
    }

    async fn detect_with_interval(&self, interval: Duration) -> bool {
        let ceiling = self.inner.config.detect_timeout();
        match wait_for_provider(self.inner.locator.as_ref(), interval, ceiling).await {
            Some(provider) => {
                self.set_provider(provider);
                self.update_accounts().await;
                true
            }
            None => self.is_extension_installed(),
        }
    }

    /// Refresh accounts, balance and network from the provider
    ///
    /// A failed account query leaves the session with no accounts.
    pub async fn update_accounts(&self) {
        let Some(provider) = self.provider() else {
            return;
        };
        match provider.account().await {
            Ok(accounts) => {
                self.inner.state.write().await.accounts = accounts;
                if let Err(e) = self.update_balance().await {
                    tracing::warn!(error = %e, "Failed to refresh balance");
                }
                if let Err(e) = self.network_data().await {
                    tracing::warn!(error = %e, "Failed to refresh network");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read wallet accounts");
                self.inner.state.write().await.accounts.clear();
            }
        }
    }

    pub async fn update_balance(&self) -> Result<()> {
        let provider = self.provider();
        let has_accounts = !self.inner.state.read().await.accounts.is_empty();
        let balance = match provider {
            Some(provider) if has_accounts => provider
                .balance()
                .await?
                .map(|b| b.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.inner.state.write().await.balance = balance;
        Ok(())
    }

    /// Read the wallet's current chain and remember it
    pub async fn network_data(&self) -> Result<NetworkData> {
        let provider = self.provider().ok_or(Error::ExtensionNotInstalled)?;
        let network = provider.chain_id().await?;
        self.inner.state.write().await.network = network.clone();
        Ok(network)
    }

    async fn set_accounts(&self, accounts: Vec<String>) {
        self.inner.state.write().await.accounts = accounts;
    }

    async fn set_status(&self, status: ConnectionStatus) {
        self.inner.state.write().await.set_status(status);
    }

    async fn set_loading(&self, loading: bool) {
        self.inner.state.write().await.loading = loading;
    }

    async fn reset_wallet_data(&self) {
        self.inner.state.write().await.reset();
    }

    /// Start a new session epoch, invalidating in-flight login attempts
    fn bump_epoch(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    fn notify(&self, notice: SessionNotice) {
        // No subscribers is fine
        let _ = self.inner.notices.send(notice);
    }

    fn toast(&self, title: &str, description: &str) {
        self.notify(SessionNotice::Toast(Notification::destructive(
            title,
            description,
        )));
    }

    fn navigate_home(&self) {
        self.notify(SessionNotice::Navigate {
            route: self.inner.config.landing_route.clone(),
        });
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("installed", &self.is_extension_installed())
            .field("backend", &self.inner.backend.name())
            .field("epoch", &self.current_epoch())
            .finish()
    }
}
