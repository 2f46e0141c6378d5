//! Cryptographic functions for dashpack
//!
//! Provides AES-256-GCM encryption with Argon2id key derivation for the
//! optional credentials entry of an archive.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;
pub mod vault;

pub use encryption::EncryptedPayload;
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use secure_memory::SecureString;
pub use vault::{CredentialVault, CredentialsData};
