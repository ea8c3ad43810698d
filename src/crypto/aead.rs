//! AES-256-GCM authenticated encryption.
//!
//! Unlike a self-describing envelope, the nonce travels separately from
//! the ciphertext here: the vault file stores it in the cleartext
//! metadata.  No associated data is used.
//!
//! Output of `seal`:
//!   [ ciphertext | 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::keys::DerivedKey;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 12-byte nonce.
///
/// Every call to `seal` must use a nonce from here; reusing one under the
/// same key breaks GCM.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt and authenticate `plaintext` under `key` and `nonce`.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Verify and decrypt data produced by `seal`.
///
/// Tag comparison happens inside the cipher.  Any failure, including a
/// truncated input, is `WrongPasswordOrCorrupt`.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::WrongPasswordOrCorrupt)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::WrongPasswordOrCorrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_output_carries_tag() {
        let key = DerivedKey::new([1u8; 32]);
        let nonce = generate_nonce();
        let ct = seal(&key, &nonce, b"abc").unwrap();
        assert_eq!(ct.len(), 3 + TAG_LEN);
    }

    #[test]
    fn open_rejects_input_shorter_than_tag() {
        let key = DerivedKey::new([1u8; 32]);
        let nonce = generate_nonce();
        let err = open(&key, &nonce, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, VaultError::WrongPasswordOrCorrupt));
    }

    #[test]
    fn open_rejects_wrong_nonce() {
        let key = DerivedKey::new([1u8; 32]);
        let nonce = generate_nonce();
        let ct = seal(&key, &nonce, b"payload").unwrap();

        let mut other = nonce;
        other[0] ^= 0xFF;
        assert!(open(&key, &other, &ct).is_err());
    }
}
