//! Entry signatures: ed25519 over the entry bytes
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unitload_core::Signer;

/// A signature as stored next to an archive entry (hex-encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySignature {
    pub signer: String,
    pub public_key: String,
    pub signature: String,
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("SIGN/KEY: {0}")]
    Key(String),

    #[error("SIGN/FORMAT: {0}")]
    Format(String),

    #[error("SIGN/VERIFY: signature by {0} does not match the entry")]
    Mismatch(String),
}

/// Fingerprint of a verifying key.
pub fn fingerprint(key: &VerifyingKey) -> String {
    format!("blake3:{}", blake3::hash(key.as_bytes()))
}

impl EntrySignature {
    /// Packaging helper: signs `data` on behalf of `signer`.
    pub fn sign(key: &SigningKey, signer: impl Into<String>, data: &[u8]) -> Self {
        let signature: Signature = key.sign(data);
        Self {
            signer: signer.into(),
            public_key: hex::encode(key.verifying_key().as_bytes()),
            signature: hex::encode(signature.to_bytes()),
        }
    }

    pub fn verify(&self, data: &[u8]) -> Result<Signer, SignatureError> {
        let key_bytes = hex::decode(&self.public_key)
            .map_err(|e| SignatureError::Key(e.to_string()))?;
        let key_bytes: [u8; 32] = key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::Key(format!("expected 32 bytes, got {}", key_bytes.len())))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| SignatureError::Key(e.to_string()))?;

        let signature_bytes = hex::decode(&self.signature)
            .map_err(|e| SignatureError::Format(e.to_string()))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|e| SignatureError::Format(e.to_string()))?;

        key.verify_strict(data, &signature)
            .map_err(|_| SignatureError::Mismatch(self.signer.clone()))?;

        Ok(Signer {
            identity: self.signer.clone(),
            fingerprint: fingerprint(&key),
        })
    }
}

/// Signers whose signature over `data` verifies; the rest are logged and dropped.
pub fn verified_signers(signatures: &[EntrySignature], data: &[u8], entry: &str) -> Vec<Signer> {
    signatures
        .iter()
        .filter_map(|signature| match signature.verify(data) {
            Ok(signer) => Some(signer),
            Err(e) => {
                tracing::warn!(entry, signer = %signature.signer, error = %e, "dropping unverifiable signature");
                None
            }
        })
        .collect()
}
