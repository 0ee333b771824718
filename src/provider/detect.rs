//! Extension detection
//!
//! The extension may inject its provider after the page loads, so a missing
//! provider is polled for a bounded time before giving up.

use super::{ProviderLocator, WalletProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Probe the locator now, then every `interval` until `ceiling` elapses
///
/// Returns `None` if the provider never appears. Absence is not an error.
pub async fn wait_for_provider(
    locator: &dyn ProviderLocator,
    interval: Duration,
    ceiling: Duration,
) -> Option<Arc<dyn WalletProvider>> {
    if let Some(provider) = locator.locate() {
        return Some(provider);
    }

    let poll = async {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the probe above covered it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Some(provider) = locator.locate() {
                return provider;
            }
        }
    };

    match tokio::time::timeout(ceiling, poll).await {
        Ok(provider) => Some(provider),
        Err(_) => {
            tracing::debug!(
                timeout_ms = ceiling.as_millis() as u64,
                "Wallet extension not detected"
            );
            None
        }
    }
}
