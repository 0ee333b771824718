//! Session state and connection status

use crate::provider::NetworkData;
use serde::{Deserialize, Serialize};

/// Where the session is in its connect/disconnect lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
    Disconnecting,
}

impl ConnectionStatus {
    /// Whether moving to `next` follows the lifecycle
    ///
    /// Any state may fall back to `Disconnected` (failure, wallet-side
    /// disconnect). An account switch re-enters `Authenticating` from
    /// `Connected`.
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connected, Connecting)
                | (Connecting, Authenticating)
                | (Disconnected, Authenticating)
                | (Connected, Authenticating)
                | (Authenticating, Connected)
                | (Connected, Disconnecting)
                | (Connecting, Disconnecting)
                | (Authenticating, Disconnecting)
                | (Disconnected, Disconnecting)
        )
    }
}

/// A submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash, or `"failed"` when the wallet returned none
    pub hash: String,
}

/// Snapshot of everything the session tracks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Wallet accounts; the first one is active
    pub accounts: Vec<String>,
    pub network: NetworkData,
    /// `"<amount> <unit>"`, empty when unknown
    pub balance: String,
    pub loading: bool,
    pub selected_chain_id: String,
    /// Most recent first
    pub transactions: Vec<TransactionRecord>,
    pub status: ConnectionStatus,
}

impl SessionState {
    pub fn active_account(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.balance.is_empty() && self.network == NetworkData::default()
    }

    pub(crate) fn record_transaction(&mut self, hash: Option<String>) {
        let hash = hash.unwrap_or_else(|| "failed".to_string());
        self.transactions.insert(0, TransactionRecord { hash });
    }

    pub(crate) fn set_status(&mut self, next: ConnectionStatus) {
        if self.status == next {
            return;
        }
        if !self.status.can_transition_to(next) {
            tracing::warn!(from = ?self.status, to = ?next, "Unexpected session transition");
        } else {
            tracing::debug!(from = ?self.status, to = ?next, "Session transition");
        }
        self.status = next;
    }

    pub(crate) fn reset(&mut self) {
        *self = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use ConnectionStatus::*;
        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Authenticating));
        assert!(Authenticating.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Disconnecting));
        assert!(Disconnecting.can_transition_to(Disconnected));

        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Disconnecting.can_transition_to(Connected));
    }

    #[test]
    fn transactions_are_most_recent_first() {
        let mut state = SessionState::default();
        state.record_transaction(Some("0x01".to_string()));
        state.record_transaction(None);

        assert_eq!(state.transactions[0].hash, "failed");
        assert_eq!(state.transactions[1].hash, "0x01");
    }

    #[test]
    fn reset_empties_state() {
        let mut state = SessionState {
            accounts: vec!["0xa".to_string()],
            balance: "1 SUPRA".to_string(),
            loading: true,
            status: ConnectionStatus::Connected,
            ..SessionState::default()
        };
        state.reset();

        assert!(state.is_empty());
        assert!(!state.loading);
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert_eq!(state.active_account(), None);
    }
}
