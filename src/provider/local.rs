//! Key-backed local wallet
//!
//! Implements [`WalletProvider`] over an in-process ed25519 key so the session
//! flow can run outside a browser (CLI, tests).
//!
//! SECURITY:
//! - The signing key is never serialized and never logged
//! - `Debug` redacts the key
//! - The wallet signs messages only; it cannot submit transactions

use super::{
    Balance, NetworkData, RawTransactionPayload, SignMessageRequest, SignatureResponse,
    TransactionRequest, WalletProvider,
};
use crate::{Error, Result};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub struct LocalWallet {
    signing_key: SigningKey,
    /// `0x`-prefixed hex public key; local wallets are addressed by their key
    address: String,
    connected: AtomicBool,
    chain_id: Mutex<String>,
}

impl LocalWallet {
    /// Create a wallet from an environment variable holding a hex seed
    pub fn from_env(var_name: &str, chain_id: &str) -> Result<Self> {
        let key_hex = std::env::var(var_name).map_err(|_| {
            Error::Config(format!(
                "Environment variable {} not set. Required for the local wallet.",
                var_name
            ))
        })?;

        Self::from_hex(&key_hex, chain_id)
    }

    /// Create a wallet from a hex-encoded 32-byte ed25519 seed
    pub fn from_hex(key_hex: &str, chain_id: &str) -> Result<Self> {
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let bytes = hex::decode(key_hex)
            .map_err(|e| Error::InvalidArgument(format!("Invalid private key: {}", e)))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "Invalid private key: expected 32 bytes, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self::from_bytes(&seed, chain_id))
    }

    pub fn from_bytes(seed: &[u8; 32], chain_id: &str) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let address = format!("0x{}", hex::encode(signing_key.verifying_key().to_bytes()));
        Self {
            signing_key,
            address,
            connected: AtomicBool::new(false),
            chain_id: Mutex::new(chain_id.to_string()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn current_chain(&self) -> String {
        self.chain_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn account(&self) -> Result<Vec<String>> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(vec![self.address.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(address = %self.address, "Local wallet connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn balance(&self) -> Result<Option<Balance>> {
        Ok(None)
    }

    async fn chain_id(&self) -> Result<NetworkData> {
        Ok(NetworkData {
            chain_id: self.current_chain(),
        })
    }

    async fn change_network(&self, chain_id: &str) -> Result<NetworkData> {
        let mut current = self.chain_id.lock().unwrap_or_else(|e| e.into_inner());
        *current = chain_id.to_string();
        Ok(NetworkData {
            chain_id: current.clone(),
        })
    }

    async fn sign_message(&self, request: &SignMessageRequest) -> Result<SignatureResponse> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::Provider("Local wallet is not connected".to_string()));
        }
        let hex_message = request
            .message
            .strip_prefix("0x")
            .unwrap_or(&request.message);
        let message = hex::decode(hex_message)
            .map_err(|e| Error::InvalidArgument(format!("Invalid hex message: {}", e)))?;

        let signature = self.signing_key.sign(&message);

        Ok(SignatureResponse {
            public_key: self.address.clone(),
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
            address: Some(self.address.clone()),
        })
    }

    async fn send_transaction(&self, _tx: &TransactionRequest) -> Result<Option<String>> {
        Err(Error::Provider(
            "Local wallet cannot submit transactions".to_string(),
        ))
    }

    async fn create_raw_transaction_data(&self, payload: &RawTransactionPayload) -> Result<String> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(format!("0x{}", hex::encode(bytes)))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

// Implement Debug manually to avoid exposing the signing key
impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
