//! StarKey Wallet Session
//!
//! Client-side session manager for the StarKey/Supra wallet:
//! - Detects the injected wallet provider
//! - Logs in by signing a server-issued nonce and exchanging the signature
//!   for an HTTP-only session cookie
//! - Keeps the session in step with wallet-originated events
//! - Relays entry function calls to the wallet for submission
//!
//! # Trust Model
//!
//! - The wallet signs and submits; this crate never holds user keys
//!   (except the CLI's explicit local wallet)
//! - The backend verifies signatures and tokens; the local signature check
//!   is a sanity flag only
//! - Session tokens are wrapped in `secrecy` types and never logged

pub mod backend;
pub mod config;
pub mod events;
pub mod provider;
pub mod session;
pub mod signing;

mod error;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use backend::{AuthBackend, HttpBackend};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use events::{EventBus, SessionNotice, WalletEvent};
pub use provider::{LocalWallet, ProviderLocator, ProviderSlot, WalletProvider};
pub use session::{ConnectionStatus, SessionState, WalletSession};
