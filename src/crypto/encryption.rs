//! AES-256-GCM encryption/decryption
//!
//! The authentication tag is stored apart from the ciphertext so the payload
//! names every piece needed to decrypt it.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{PackError, PackResult};

use super::key_derivation::KeyDerivationParams;
use super::DerivedKey;

/// Algorithm identifier stored in payloads
pub const CIPHER_ALGORITHM: &str = "aes-256-gcm";

/// Current payload version
pub const PAYLOAD_VERSION: u8 = 1;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Encrypted data with everything needed to decrypt it except the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub version: u8,
    pub algorithm: String,
    pub kdf: KeyDerivationParams,
    /// Nonce (base64 encoded)
    pub iv: String,
    /// Authentication tag (base64 encoded)
    pub tag: String,
    /// Ciphertext without the tag (base64 encoded)
    pub ciphertext: String,
}

/// Decoded binary parts of a payload
pub(crate) struct PayloadParts {
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Structural checks plus base64 decoding; never touches the key
    pub(crate) fn parts(&self) -> PackResult<PayloadParts> {
        if self.version != PAYLOAD_VERSION {
            return Err(PackError::InvalidCredentials(format!(
                "unsupported payload version {}",
                self.version
            )));
        }
        if self.algorithm != CIPHER_ALGORITHM {
            return Err(PackError::InvalidCredentials(format!(
                "unsupported cipher '{}'",
                self.algorithm
            )));
        }
        self.kdf.check()?;

        let iv = decode_field("iv", &self.iv)?;
        if iv.len() != NONCE_SIZE {
            return Err(PackError::InvalidCredentials(format!(
                "iv must be {} bytes",
                NONCE_SIZE
            )));
        }
        let tag = decode_field("tag", &self.tag)?;
        if tag.len() != TAG_SIZE {
            return Err(PackError::InvalidCredentials(format!(
                "tag must be {} bytes",
                TAG_SIZE
            )));
        }
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;

        Ok(PayloadParts {
            iv,
            tag,
            ciphertext,
        })
    }
}

fn decode_field(name: &str, value: &str) -> PackResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|_| PackError::InvalidCredentials(format!("{} is not valid base64", name)))
}

/// Encrypt plaintext with a fresh random nonce
pub fn encrypt(
    plaintext: &[u8],
    key: &DerivedKey,
    kdf: KeyDerivationParams,
) -> PackResult<EncryptedPayload> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PackError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| PackError::Encryption("Encryption failed".into()))?;

    let split = sealed
        .len()
        .checked_sub(TAG_SIZE)
        .ok_or_else(|| PackError::Encryption("Cipher output shorter than tag".into()))?;
    let tag = sealed.split_off(split);

    Ok(EncryptedPayload {
        version: PAYLOAD_VERSION,
        algorithm: CIPHER_ALGORITHM.to_string(),
        kdf,
        iv: STANDARD.encode(nonce_bytes),
        tag: STANDARD.encode(tag),
        ciphertext: STANDARD.encode(sealed),
    })
}

/// Decrypt a payload whose parts were already validated.
///
/// Every failure collapses into [`PackError::Decryption`].
pub(crate) fn decrypt(parts: &PayloadParts, key: &DerivedKey) -> PackResult<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| PackError::Decryption)?;

    let mut sealed = Vec::with_capacity(parts.ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(&parts.ciphertext);
    sealed.extend_from_slice(&parts.tag);

    cipher
        .decrypt(Nonce::from_slice(&parts.iv), sealed.as_ref())
        .map(Zeroizing::new)
        .map_err(|_| PackError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, tests::fast_cost};

    fn seal(plaintext: &[u8], password: &str) -> EncryptedPayload {
        let kdf = KeyDerivationParams::generate(fast_cost());
        let key = derive_key(password, &kdf).unwrap();
        encrypt(plaintext, &key, kdf).unwrap()
    }

    fn open(payload: &EncryptedPayload, password: &str) -> PackResult<Zeroizing<Vec<u8>>> {
        let parts = payload.parts()?;
        let key = derive_key(password, &payload.kdf)?;
        decrypt(&parts, &key)
    }

    #[test]
    fn test_encrypt_decrypt() {
        let payload = seal(b"{\"a\":1}", "pw");
        assert_eq!(open(&payload, "pw").unwrap().as_slice(), b"{\"a\":1}");
        assert_eq!(payload.algorithm, CIPHER_ALGORITHM);
        assert_eq!(payload.kdf.algorithm, "argon2id");
    }

    #[test]
    fn test_tag_stored_separately() {
        let payload = seal(b"hello", "pw");
        assert_eq!(STANDARD.decode(&payload.tag).unwrap().len(), TAG_SIZE);
        assert_eq!(STANDARD.decode(&payload.ciphertext).unwrap().len(), 5);
    }

    #[test]
    fn test_different_nonces() {
        let a = seal(b"same", "pw");
        let b = seal(b"same", "pw");
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_password_is_generic_error() {
        let payload = seal(b"secret", "right");
        let err = open(&payload, "wrong").unwrap_err();
        assert!(matches!(err, PackError::Decryption));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let mut payload = seal(b"secret", "pw");
        let mut tag = STANDARD.decode(&payload.tag).unwrap();
        tag[0] ^= 0xFF;
        payload.tag = STANDARD.encode(tag);

        assert!(matches!(open(&payload, "pw"), Err(PackError::Decryption)));
    }

    #[test]
    fn test_bad_shape_is_distinct_from_decryption() {
        let mut payload = seal(b"secret", "pw");
        payload.iv = STANDARD.encode([0u8; 4]);
        assert!(matches!(
            open(&payload, "pw"),
            Err(PackError::InvalidCredentials(_))
        ));

        let mut payload = seal(b"secret", "pw");
        payload.algorithm = "chacha20".into();
        assert!(matches!(
            payload.parts(),
            Err(PackError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let payload = seal(b"", "pw");
        assert!(open(&payload, "pw").unwrap().is_empty());
    }
}
