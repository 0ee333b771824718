//! Message encoding and signature checks
//!
//! The wallet signs the raw UTF-8 bytes of the login message; the message is
//! only hex-encoded for transport. The returned signature is re-verified
//! locally as a sanity check. A failed check is reported as a flag, never as
//! an error: the backend is the party that decides whether a login is valid.

use crate::provider::SignatureResponse;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// `0x`-prefixed lowercase hex of the message's UTF-8 bytes
pub fn encode_message(message: &str) -> String {
    format!("0x{}", hex::encode(message.as_bytes()))
}

fn decode_fixed<const N: usize>(input: &str) -> Option<[u8; N]> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed).ok()?.try_into().ok()
}

/// Verify a detached ed25519 signature over `message`
///
/// Returns false for malformed keys or signatures as well as for a
/// signature that does not match.
pub fn verify_detached(message: &str, signature_hex: &str, public_key_hex: &str) -> bool {
    let Some(key_bytes) = decode_fixed::<32>(public_key_hex) else {
        return false;
    };
    let Some(sig_bytes) = decode_fixed::<64>(signature_hex) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    key.verify(message.as_bytes(), &Signature::from_bytes(&sig_bytes))
        .is_ok()
}

/// Wallet signature plus the local verification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub public_key: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub verified: bool,
}

impl SignedMessage {
    pub fn from_response(message: &str, response: SignatureResponse) -> Self {
        let verified = verify_detached(message, &response.signature, &response.public_key);
        if !verified {
            tracing::warn!(
                public_key = %response.public_key,
                "Wallet signature did not verify locally"
            );
        }
        Self {
            public_key: response.public_key,
            signature: response.signature,
            address: response.address,
            verified,
        }
    }
}
