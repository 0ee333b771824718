//! In-memory provider and backend for tests
//!
//! Both record into one shared [`CallLog`] so tests can assert the order of
//! wallet and backend calls.

use crate::backend::{
    AuthBackend, AuthNonce, AuthRequest, AuthToken, BackendRequest, BackendResponse,
};
use crate::provider::{
    Balance, NetworkData, RawTransactionPayload, SignMessageRequest, SignatureResponse,
    TransactionRequest, WalletProvider,
};
use crate::{Error, Result};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    /// Entries except detached account registrations, whose timing is not
    /// deterministic
    pub fn entries(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.starts_with("register:"))
            .cloned()
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct FakeProvider {
    log: CallLog,
    key: SigningKey,
    accounts: Mutex<Vec<String>>,
    chain_id: Mutex<String>,
    tx_hash: Mutex<Option<String>>,
    pub fail_disconnect: AtomicBool,
    pub fail_accounts: AtomicBool,
    pub last_payload: Mutex<Option<Value>>,
    pub last_tx: Mutex<Option<TransactionRequest>>,
}

impl FakeProvider {
    pub fn new(log: CallLog, accounts: &[&str], chain_id: &str) -> Self {
        Self {
            log,
            key: SigningKey::from_bytes(&[42u8; 32]),
            accounts: Mutex::new(accounts.iter().map(|a| a.to_string()).collect()),
            chain_id: Mutex::new(chain_id.to_string()),
            tx_hash: Mutex::new(Some("0xhash".to_string())),
            fail_disconnect: AtomicBool::new(false),
            fail_accounts: AtomicBool::new(false),
            last_payload: Mutex::new(None),
            last_tx: Mutex::new(None),
        }
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        *self.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub fn set_tx_hash(&self, hash: Option<&str>) {
        *self.tx_hash.lock().unwrap() = hash.map(str::to_string);
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn account(&self) -> Result<Vec<String>> {
        self.log.push("account");
        if self.fail_accounts.load(Ordering::SeqCst) {
            return Err(Error::Provider("wallet locked".to_string()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn connect(&self) -> Result<()> {
        self.log.push("connect");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.log.push("disconnect");
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(Error::Provider("extension crashed".to_string()));
        }
        Ok(())
    }

    async fn balance(&self) -> Result<Option<Balance>> {
        Ok(Some(Balance {
            formatted_balance: "10".to_string(),
            display_unit: "SUPRA".to_string(),
        }))
    }

    async fn chain_id(&self) -> Result<NetworkData> {
        self.log.push("chain_id");
        Ok(NetworkData {
            chain_id: self.chain_id.lock().unwrap().clone(),
        })
    }

    async fn change_network(&self, chain_id: &str) -> Result<NetworkData> {
        self.log.push(format!("change_network:{chain_id}"));
        *self.chain_id.lock().unwrap() = chain_id.to_string();
        Ok(NetworkData {
            chain_id: chain_id.to_string(),
        })
    }

    async fn sign_message(&self, request: &SignMessageRequest) -> Result<SignatureResponse> {
        self.log.push("sign");
        let message = hex::decode(request.message.trim_start_matches("0x")).unwrap();
        let signature = self.key.sign(&message);
        Ok(SignatureResponse {
            public_key: format!("0x{}", hex::encode(self.key.verifying_key().to_bytes())),
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
            address: None,
        })
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<Option<String>> {
        self.log.push("send_transaction");
        *self.last_tx.lock().unwrap() = Some(tx.clone());
        Ok(self.tx_hash.lock().unwrap().clone())
    }

    async fn create_raw_transaction_data(&self, payload: &RawTransactionPayload) -> Result<String> {
        self.log.push("create_raw");
        *self.last_payload.lock().unwrap() = Some(serde_json::to_value(payload)?);
        Ok("0xraw".to_string())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeBackend {
    log: CallLog,
    session_valid: AtomicBool,
    fail_auth: AtomicBool,
    nonce_delay: Duration,
    nonces: AtomicUsize,
}

impl FakeBackend {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            session_valid: AtomicBool::new(false),
            fail_auth: AtomicBool::new(false),
            nonce_delay: Duration::ZERO,
            nonces: AtomicUsize::new(0),
        }
    }

    pub fn with_nonce_delay(mut self, delay: Duration) -> Self {
        self.nonce_delay = delay;
        self
    }

    pub fn set_session_valid(&self, valid: bool) {
        self.session_valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn fetch_nonce(&self) -> Result<AuthNonce> {
        self.log.push("nonce");
        if !self.nonce_delay.is_zero() {
            tokio::time::sleep(self.nonce_delay).await;
        }
        let n = self.nonces.fetch_add(1, Ordering::SeqCst);
        Ok(AuthNonce::new(format!("nonce-{n}")))
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthToken> {
        self.log.push(format!("authenticate:{}", request.address));
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(Error::Authentication("signature rejected".to_string()));
        }
        Ok(AuthToken::new(format!("token-{}", request.address)))
    }

    async fn store_session(&self, _token: &AuthToken) -> Result<()> {
        self.log.push("store_session");
        self.session_valid.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.log.push("logout");
        self.session_valid.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn check_session(&self) -> Result<bool> {
        self.log.push("check");
        Ok(self.session_valid.load(Ordering::SeqCst))
    }

    async fn register_account(&self, address: &str) -> Result<()> {
        self.log.push(format!("register:{address}"));
        Ok(())
    }

    async fn send(&self, request: BackendRequest) -> Result<BackendResponse> {
        self.log.push(format!("send:{}", request.path));
        Ok(BackendResponse {
            status: 200,
            body: json!({ "ok": true, "request": request.body }),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
