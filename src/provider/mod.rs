//! Wallet provider abstraction
//!
//! The StarKey extension injects a provider object into the page. This crate
//! never owns that object: it only holds an `Arc<dyn WalletProvider>` found
//! through a [`ProviderLocator`]. Everything the extension does (prompting
//! the user, signing, submitting transactions) happens behind this trait.

mod detect;
mod local;

pub use detect::wait_for_provider;
pub use local::LocalWallet;

use crate::Result;
use async_trait::async_trait;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Network the wallet is currently on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    pub chain_id: String,
}

/// Account balance as reported by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub formatted_balance: String,
    pub display_unit: String,
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.formatted_balance, self.display_unit)
    }
}

/// Message signing request; `message` is `0x`-prefixed hex of the UTF-8 text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageRequest {
    pub message: String,
    pub nonce: String,
}

/// What the wallet returns for a signing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    /// `0x`-prefixed hex ed25519 public key
    pub public_key: String,
    /// `0x`-prefixed hex detached signature
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Transaction handed to the wallet for approval and submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub value: String,
    pub data: String,
    pub chain_id: String,
}

/// A Move entry function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCall {
    pub module_address: String,
    pub module_name: String,
    pub function_name: String,
    /// Type arguments
    #[serde(default)]
    pub type_args: Vec<Value>,
    /// Positional arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Options block at the tail of a raw transaction payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionOptions {
    /// Advisory deadline (unix seconds), enforced by the chain
    pub tx_expiry_time: i64,
}

/// Raw transaction payload
///
/// Serializes as the ordered tuple
/// `[sender, sequence_number, module_address, module_name, function_name,
/// type_args, args, options]` the wallet expects.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransactionPayload {
    pub sender: String,
    pub sequence_number: u64,
    pub call: ModuleCall,
    pub options: RawTransactionOptions,
}

impl Serialize for RawTransactionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(8)?;
        tuple.serialize_element(&self.sender)?;
        tuple.serialize_element(&self.sequence_number)?;
        tuple.serialize_element(&self.call.module_address)?;
        tuple.serialize_element(&self.call.module_name)?;
        tuple.serialize_element(&self.call.function_name)?;
        tuple.serialize_element(&self.call.type_args)?;
        tuple.serialize_element(&self.call.args)?;
        tuple.serialize_element(&self.options)?;
        tuple.end()
    }
}

/// Capability set exposed by an injected wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts visible to this site; the first is the active one
    async fn account(&self) -> Result<Vec<String>>;

    /// Ask the user to connect this site
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// Balance of the active account, if the wallet reports one
    async fn balance(&self) -> Result<Option<Balance>>;

    async fn chain_id(&self) -> Result<NetworkData>;

    async fn change_network(&self, chain_id: &str) -> Result<NetworkData>;

    async fn sign_message(&self, request: &SignMessageRequest) -> Result<SignatureResponse>;

    /// Submit a transaction; `None` when the wallet returns no hash
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<Option<String>>;

    /// Encode a raw payload into the wallet's transaction data format
    async fn create_raw_transaction_data(&self, payload: &RawTransactionPayload) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Where an injected provider is looked up
pub trait ProviderLocator: Send + Sync {
    fn locate(&self) -> Option<Arc<dyn WalletProvider>>;
}

/// A provider slot that can be filled at any time
///
/// Stands in for the page global the extension writes into.
#[derive(Clone, Default)]
pub struct ProviderSlot {
    inner: Arc<RwLock<Option<Arc<dyn WalletProvider>>>>,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot that already holds a provider
    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        let slot = Self::new();
        slot.install(provider);
        slot
    }

    pub fn install(&self, provider: Arc<dyn WalletProvider>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(provider);
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl ProviderLocator for ProviderSlot {
    fn locate(&self) -> Option<Arc<dyn WalletProvider>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("installed", &self.locate().is_some())
            .finish()
    }
}
