//! Credential vault
//!
//! Encrypts the per-integration secret fields collected at export time into a
//! single [`EncryptedPayload`], and turns such a payload back into plaintext
//! on import. Shape problems are reported as
//! [`PackError::InvalidCredentials`]; anything that goes wrong after the shape
//! checks pass is reported as the opaque [`PackError::Decryption`].

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::KeyDerivationCost;
use crate::error::{PackError, PackResult};
use crate::models::SecretFields;

use super::encryption::{self, EncryptedPayload};
use super::key_derivation::{derive_key, KeyDerivationParams};

/// Original integration id -> secret field values
pub type CredentialsData = BTreeMap<String, SecretFields>;

/// Password-based encryption of credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialVault {
    cost: KeyDerivationCost,
}

impl CredentialVault {
    /// Vault using the given Argon2id cost for new payloads
    pub fn new(cost: KeyDerivationCost) -> Self {
        Self { cost }
    }

    /// Encrypt credentials with a fresh salt and nonce
    pub fn encrypt(&self, data: &CredentialsData, password: &str) -> PackResult<EncryptedPayload> {
        if password.is_empty() {
            return Err(PackError::Encryption("Password cannot be empty".into()));
        }

        let plaintext = Zeroizing::new(
            serde_json::to_vec(data)
                .map_err(|e| PackError::Encryption(format!("Failed to serialize credentials: {}", e)))?,
        );

        let kdf = KeyDerivationParams::generate(self.cost);
        let key = derive_key(password, &kdf)?;
        let payload = encryption::encrypt(&plaintext, &key, kdf)?;

        debug!(integrations = data.len(), "Encrypted credentials payload");
        Ok(payload)
    }

    /// Decrypt a payload.
    ///
    /// Wrong password, tampering and corrupted ciphertext all produce the same
    /// [`PackError::Decryption`].
    pub fn decrypt(&self, payload: &EncryptedPayload, password: &str) -> PackResult<CredentialsData> {
        let parts = payload.parts()?;
        let key = derive_key(password, &payload.kdf).map_err(|e| match e {
            PackError::InvalidCredentials(_) => e,
            _ => PackError::Decryption,
        })?;
        let plaintext = encryption::decrypt(&parts, &key)?;

        serde_json::from_slice(&plaintext).map_err(|_| PackError::Decryption)
    }

    /// Parse a raw JSON value into a payload, checking its shape
    pub fn parse_payload(value: &Value) -> PackResult<EncryptedPayload> {
        let payload: EncryptedPayload = serde_json::from_value(value.clone())
            .map_err(|e| PackError::InvalidCredentials(format!("malformed payload: {}", e)))?;
        payload.parts()?;
        Ok(payload)
    }

    /// Structural validation performed before any decryption attempt
    pub fn is_valid_payload_shape(value: &Value) -> bool {
        Self::parse_payload(value).is_ok()
    }
}
