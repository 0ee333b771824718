//! Configuration for the wallet session manager

pub mod endpoints;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use endpoints::BackendEndpoints;

/// Required Supra chain id environment variable name
pub const CHAIN_ID_ENV: &str = "SUPRA_CHAIN_ID";

/// Hex-encoded ed25519 key used by the CLI's local wallet
pub const PRIVATE_KEY_ENV: &str = "STARKEY_PRIVATE_KEY";

/// Chain id used when none is configured
pub const DEFAULT_CHAIN_ID: &str = "6";

/// Messages presented to the wallet for signing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginMessages {
    /// Signed on explicit connect
    pub connect: String,
    /// Signed on explicit sign-in
    pub sign_in: String,
    /// Signed when the session check finds an expired token
    pub token_expiry: String,
    /// Signed after the wallet switches accounts
    pub account_switch: String,
}

impl Default for LoginMessages {
    fn default() -> Self {
        Self {
            connect: "Sign message to login to Crystara".to_string(),
            sign_in: "Sign message to revalidate login to Crystara".to_string(),
            token_expiry: "Token Expiry: Sign message to revalidate login to Crystara".to_string(),
            account_switch: "Sign this message to login to Crystara".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Backend endpoints
    pub backend: BackendEndpoints,
    /// Chain the wallet must be on before login or transactions
    pub required_chain_id: String,
    /// Extension detection poll interval (milliseconds)
    pub detect_interval_ms: u64,
    /// Give up detecting the extension after this long (milliseconds)
    pub detect_timeout_ms: u64,
    /// Poll interval after an extension-installed event (milliseconds)
    pub reinstall_poll_interval_ms: u64,
    /// Session revalidation period (milliseconds)
    pub revalidate_interval_ms: u64,
    /// Advisory transaction expiry, added to the current time (seconds)
    pub tx_expiry_secs: i64,
    /// Route navigated to after disconnect
    pub landing_route: String,
    /// Login messages
    pub messages: LoginMessages,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendEndpoints::default(),
            required_chain_id: DEFAULT_CHAIN_ID.to_string(),
            detect_interval_ms: 1_000,
            detect_timeout_ms: 5_000,
            reinstall_poll_interval_ms: 500,
            revalidate_interval_ms: 86_400_000, // 1 day
            tx_expiry_secs: 3_000,
            landing_route: "/".to_string(),
            messages: LoginMessages::default(),
        }
    }
}

impl SessionConfig {
    /// Defaults overlaid with `STARKEY_BACKEND_URL` and `SUPRA_CHAIN_ID`
    pub fn from_env() -> Self {
        let mut config = Self {
            backend: BackendEndpoints::from_env(),
            ..Self::default()
        };
        config.apply_env_overrides();
        config
    }

    /// Load a JSON config file; env vars still win over the file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        if let Ok(url) = std::env::var(endpoints::env_vars::BACKEND_URL) {
            config.backend.base_url = url;
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject periods tokio cannot tick on
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("detect_interval_ms", self.detect_interval_ms),
            ("reinstall_poll_interval_ms", self.reinstall_poll_interval_ms),
            ("revalidate_interval_ms", self.revalidate_interval_ms),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(Error::Config(format!("{field} must be greater than zero")));
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(chain_id) = std::env::var(CHAIN_ID_ENV) {
            if !chain_id.is_empty() {
                tracing::debug!(chain_id = %chain_id, "Using SUPRA_CHAIN_ID");
                self.required_chain_id = chain_id;
            }
        }
    }

    // Poll periods are floored at 1 ms; a zero period panics in tokio
    pub fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms.max(1))
    }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_millis(self.detect_timeout_ms)
    }

    pub fn reinstall_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reinstall_poll_interval_ms.max(1))
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_millis(self.revalidate_interval_ms.max(1))
    }
}
