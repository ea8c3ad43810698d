//! Cryptographic primitives for AcctVault.
//!
//! This module provides:
//! - scrypt password-based key derivation (`kdf`)
//! - AES-256-GCM sealing and opening with caller-supplied nonces (`aead`)
//! - The zeroize-on-drop `DerivedKey` wrapper (`keys`)

pub mod aead;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, ...};
pub use aead::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, ScryptParams, KDF_NAME, SALT_LEN};
pub use keys::{DerivedKey, KEY_LEN};
