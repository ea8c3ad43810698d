//! Vault module — the encrypted record store.
//!
//! This module provides:
//! - The decrypted document type and its schema migrations (`payload`)
//! - The on-disk container and atomic writes (`format`)
//! - High-level `VaultStore` lifecycle (`store`)

pub mod format;
pub mod payload;
pub mod store;

// Re-export the most commonly used items.
pub use format::{RawVault, VaultMetadata};
pub use payload::PlaintextPayload;
pub use store::{VaultState, VaultStore};
