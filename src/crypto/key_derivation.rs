//! Key derivation using Argon2id
//!
//! Derives the credential-payload key from the export password. The salt and
//! cost parameters travel inside the payload so any instance can re-derive
//! the key, whatever its own configured costs are.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::KeyDerivationCost;
use crate::error::{PackError, PackResult};

/// Algorithm identifier stored in payloads
pub const KDF_ALGORITHM: &str = "argon2id";

/// Salt length in bytes for new payloads
pub const SALT_SIZE: usize = 16;

/// Smallest salt accepted when reading a payload
pub const MIN_SALT_SIZE: usize = 8;

/// Upper bound on memory cost accepted from a payload (1 GiB)
pub const MAX_MEMORY_COST: u32 = 1024 * 1024;

/// Upper bound on iterations accepted from a payload
pub const MAX_TIME_COST: u32 = 16;

/// Upper bound on lanes accepted from a payload
pub const MAX_PARALLELISM: u32 = 16;

/// Parameters for key derivation, as stored in an encrypted payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Always [`KDF_ALGORITHM`]
    pub algorithm: String,
    /// Salt (base64 encoded)
    pub salt: String,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism degree
    pub parallelism: u32,
}

impl KeyDerivationParams {
    /// Fresh parameters with a random salt
    pub fn generate(cost: KeyDerivationCost) -> Self {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        Self::with_values(
            STANDARD.encode(salt),
            cost.memory_cost,
            cost.time_cost,
            cost.parallelism,
        )
    }

    /// Create params with specific values
    pub fn with_values(salt: String, memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            algorithm: KDF_ALGORITHM.to_string(),
            salt,
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Decoded salt bytes
    pub fn salt_bytes(&self) -> PackResult<Vec<u8>> {
        let salt = STANDARD
            .decode(&self.salt)
            .map_err(|_| PackError::InvalidCredentials("salt is not valid base64".into()))?;
        if salt.len() < MIN_SALT_SIZE {
            return Err(PackError::InvalidCredentials("salt is too short".into()));
        }
        Ok(salt)
    }

    /// Check the parameters are usable without deriving anything
    pub fn check(&self) -> PackResult<()> {
        if self.algorithm != KDF_ALGORITHM {
            return Err(PackError::InvalidCredentials(format!(
                "unsupported key derivation algorithm '{}'",
                self.algorithm
            )));
        }
        if self.memory_cost > MAX_MEMORY_COST {
            return Err(PackError::InvalidCredentials(
                "key derivation memory cost is too high".into(),
            ));
        }
        if self.time_cost > MAX_TIME_COST {
            return Err(PackError::InvalidCredentials(
                "key derivation time cost is too high".into(),
            ));
        }
        if self.parallelism > MAX_PARALLELISM {
            return Err(PackError::InvalidCredentials(
                "key derivation parallelism is too high".into(),
            ));
        }
        self.salt_bytes()?;
        self.argon2_params()?;
        Ok(())
    }

    fn argon2_params(&self) -> PackResult<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| PackError::InvalidCredentials(format!("invalid Argon2 parameters: {}", e)))
    }
}

const KEY_SIZE: usize = 32;

/// A derived AES-256 key, wiped on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

/// Derive an encryption key from a password
pub fn derive_key(password: &str, params: &KeyDerivationParams) -> PackResult<DerivedKey> {
    params.check()?;
    let salt = params.salt_bytes()?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.argon2_params()?);

    let mut key = DerivedKey {
        key: [0u8; KEY_SIZE],
    };
    argon2
        .hash_password_into(password.as_bytes(), &salt, &mut key.key)
        .map_err(|e| PackError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Cheap costs so tests stay fast
    pub(crate) fn fast_cost() -> KeyDerivationCost {
        KeyDerivationCost {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_same_password_same_key() {
        let params = KeyDerivationParams::generate(fast_cost());
        let key1 = derive_key("correct horse", &params).unwrap();
        let key2 = derive_key("correct horse", &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_password_different_key() {
        let params = KeyDerivationParams::generate(fast_cost());
        let key1 = derive_key("password1", &params).unwrap();
        let key2 = derive_key("password2", &params).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same", &KeyDerivationParams::generate(fast_cost())).unwrap();
        let key2 = derive_key("same", &KeyDerivationParams::generate(fast_cost())).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_check_rejects_bad_params() {
        let mut params = KeyDerivationParams::generate(fast_cost());
        params.algorithm = "scrypt".into();
        assert!(matches!(params.check(), Err(PackError::InvalidCredentials(_))));

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.salt = "!!".into();
        assert!(params.check().is_err());

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.memory_cost = MAX_MEMORY_COST + 1;
        assert!(params.check().is_err());

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.time_cost = 0;
        assert!(params.check().is_err());

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.time_cost = u32::MAX;
        assert!(matches!(params.check(), Err(PackError::InvalidCredentials(_))));

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.time_cost = MAX_TIME_COST + 1;
        assert!(matches!(params.check(), Err(PackError::InvalidCredentials(_))));

        let mut params = KeyDerivationParams::generate(fast_cost());
        params.parallelism = MAX_PARALLELISM + 1;
        assert!(matches!(params.check(), Err(PackError::InvalidCredentials(_))));
    }

    #[test]
    fn test_check_accepts_upper_bounds() {
        let mut params = KeyDerivationParams::generate(fast_cost());
        params.time_cost = MAX_TIME_COST;
        params.parallelism = MAX_PARALLELISM;
        params.memory_cost = 8 * MAX_PARALLELISM;
        assert!(params.check().is_ok());
    }
}
