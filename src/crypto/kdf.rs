//! Password-based key derivation using scrypt.
//!
//! scrypt is memory-hard, which makes offline guessing on GPUs and ASICs
//! expensive.  The cost parameters used for a vault are written into its
//! metadata so a later read always re-derives with the same cost, even if
//! the defaults here change.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::keys::{DerivedKey, KEY_LEN};
use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Identifier recorded in the vault metadata `kdf` field.
pub const KDF_NAME: &str = "scrypt";

/// Lowest accepted cost exponent (N = 1024).
pub const MIN_LOG_N: u8 = 10;

/// Highest accepted cost exponent (N = 2^20).
pub const MAX_LOG_N: u8 = 20;

/// Highest accepted block size.
pub const MAX_R: u32 = 32;

/// Highest accepted parallelization.
pub const MAX_P: u32 = 16;

/// Ceiling on scrypt's working memory (128 * r * N bytes).
pub const MAX_MEMORY: u64 = 1 << 30;

/// scrypt cost parameters.
///
/// Serialized into the vault metadata as `kdf_params`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    /// log2 of the CPU/memory cost factor N (default: 15, N = 32768).
    pub log_n: u8,
    /// Block size (default: 8).
    pub r: u32,
    /// Parallelization (default: 1).
    pub p: u32,
}

impl ScryptParams {
    /// Check the cost against the accepted range.
    ///
    /// The error string names the offending field.
    pub fn check(&self) -> std::result::Result<(), String> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&self.log_n) {
            return Err(format!(
                "scrypt log_n must be between {MIN_LOG_N} and {MAX_LOG_N} (got {})",
                self.log_n
            ));
        }
        if !(1..=MAX_R).contains(&self.r) {
            return Err(format!(
                "scrypt r must be between 1 and {MAX_R} (got {})",
                self.r
            ));
        }
        if !(1..=MAX_P).contains(&self.p) {
            return Err(format!(
                "scrypt p must be between 1 and {MAX_P} (got {})",
                self.p
            ));
        }
        let memory = (128 * u64::from(self.r)) << self.log_n;
        if memory > MAX_MEMORY {
            return Err(format!(
                "scrypt cost needs {memory} bytes of memory (limit {MAX_MEMORY})"
            ));
        }
        Ok(())
    }
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

/// Derive a 32-byte key from a password and a 16-byte salt using the
/// default scrypt parameters (N=2^15, r=8, p=1).
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    derive_key_with_params(password, salt, &ScryptParams::default())
}

/// Derive a 32-byte key with explicit scrypt parameters.
///
/// The same password + salt + params always produce the same key.
/// Rejects a salt that is not exactly 16 bytes and parameters outside
/// the accepted cost range.
pub fn derive_key_with_params(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidParameters(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }
    params.check().map_err(VaultError::InvalidParameters)?;

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| VaultError::InvalidParameters(format!("invalid scrypt params: {e}")))?;

    debug!(
        log_n = params.log_n,
        r = params.r,
        p = params.p,
        "deriving vault key"
    );

    let mut key = DerivedKey::zeroed();
    scrypt::scrypt(password, salt, &scrypt_params, key.as_mut_bytes())
        .map_err(|e| VaultError::InvalidParameters(format!("scrypt failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> ScryptParams {
        ScryptParams {
            log_n: MIN_LOG_N,
            ..ScryptParams::default()
        }
    }

    #[test]
    fn default_params_match_vault_version_1() {
        let p = ScryptParams::default();
        assert_eq!((p.log_n, p.r, p.p), (15, 8, 1));
    }

    #[test]
    fn rejects_short_salt() {
        let err = derive_key_with_params(b"pw", &[0u8; 8], &cheap()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameters(_)));
    }

    #[test]
    fn rejects_long_salt() {
        let err = derive_key_with_params(b"pw", &[0u8; 32], &cheap()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameters(_)));
    }

    #[test]
    fn rejects_weak_cost() {
        let params = ScryptParams {
            log_n: 4,
            ..ScryptParams::default()
        };
        let err = derive_key_with_params(b"pw", &[0u8; SALT_LEN], &params).unwrap_err();
        assert!(matches!(err, VaultError::InvalidParameters(_)));
    }

    #[test]
    fn rejects_zero_block_size() {
        let params = ScryptParams { r: 0, ..cheap() };
        assert!(derive_key_with_params(b"pw", &[0u8; SALT_LEN], &params).is_err());
    }

    #[test]
    fn rejects_oversized_cost() {
        for params in [
            ScryptParams { log_n: 40, ..cheap() },
            ScryptParams { p: 2000, ..cheap() },
            ScryptParams { r: 64, ..cheap() },
            ScryptParams { log_n: 20, r: 32, p: 1 },
        ] {
            let err = derive_key_with_params(b"pw", &[0u8; SALT_LEN], &params).unwrap_err();
            assert!(matches!(err, VaultError::InvalidParameters(_)), "{params:?}");
        }
    }

    #[test]
    fn default_cost_is_within_bounds() {
        assert!(ScryptParams::default().check().is_ok());
        assert!(cheap().check().is_ok());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn params_serialize_with_short_names() {
        let json = serde_json::to_value(ScryptParams::default()).unwrap();
        assert_eq!(json, serde_json::json!({"log_n": 15, "r": 8, "p": 1}));
    }
}
