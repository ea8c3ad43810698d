//! Vault lifecycle: create, open, save, lock and password rotation.
//!
//! `VaultStore` owns the derived key and the decrypted payload for one
//! vault path.  Accessors only touch memory; nothing reaches disk until
//! `save()` is called.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::info;
use zeroize::Zeroize;

use crate::crypto::aead::{self, generate_nonce};
use crate::crypto::kdf::{derive_key_with_params, generate_salt, ScryptParams, SALT_LEN};
use crate::crypto::keys::DerivedKey;
use crate::errors::{Result, VaultError};

use super::format::{self, VaultMetadata};
use super::payload::PlaintextPayload;

/// A temp file untouched for this long belongs to no live save.
const STALE_TEMP_AGE: Duration = Duration::from_secs(60);

/// Lifecycle state of a `VaultStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No key in memory.  The file may or may not exist.
    Closed,
    /// Key and payload in memory.
    Open,
    /// Closed by an explicit `lock()`.
    Locked,
}

/// Everything held in memory while the vault is open.
struct Session {
    /// Zeroized on drop.
    key: DerivedKey,
    salt: [u8; SALT_LEN],
    kdf_params: ScryptParams,
    payload: PlaintextPayload,
}

/// The main vault handle.
///
/// Start from `VaultStore::new(path)` and call `create` or `open`, or use
/// the `create_at`/`open_at` shortcuts.
pub struct VaultStore {
    /// Path to the vault file on disk.
    path: PathBuf,

    /// Present only while the vault is open.
    session: Option<Session>,

    /// Set by `lock()`, cleared by the next successful open.
    locked: bool,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A closed handle for the vault at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session: None,
            locked: false,
        }
    }

    /// Create a brand-new vault at `path` and return it open.
    pub fn create_at(path: &Path, password: &[u8]) -> Result<Self> {
        let mut store = Self::new(path);
        store.create(password)?;
        Ok(store)
    }

    /// Open an existing vault at `path`.
    pub fn open_at(path: &Path, password: &[u8]) -> Result<Self> {
        let mut store = Self::new(path);
        store.open(password)?;
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create the vault file with the default scrypt cost.
    pub fn create(&mut self, password: &[u8]) -> Result<()> {
        self.create_with_params(password, &ScryptParams::default())
    }

    /// Create the vault file with an explicit scrypt cost.
    ///
    /// Generates a random salt, derives the key, and writes an empty
    /// payload `{version: 1, settings: {}, accounts: []}`.  Fails with
    /// `AlreadyExists` if anything is already at the path, including a
    /// vault another process created while this one was deriving.
    pub fn create_with_params(&mut self, password: &[u8], params: &ScryptParams) -> Result<()> {
        self.ensure_not_open()?;
        if self.path.exists() {
            return Err(VaultError::AlreadyExists(self.path.clone()));
        }

        let salt = generate_salt();
        let key = derive_key_with_params(password, &salt, params)?;
        let payload = PlaintextPayload::default();

        let (metadata, ciphertext) = seal_payload(&key, &salt, *params, &payload)?;
        format::create_vault(&self.path, &metadata, &ciphertext)?;

        self.session = Some(Session {
            key,
            salt,
            kdf_params: *params,
            payload,
        });
        self.locked = false;

        info!(path = %self.path.display(), "vault created");
        Ok(())
    }

    /// Unlock an existing vault.
    ///
    /// A wrong password and a damaged ciphertext both fail with
    /// `WrongPasswordOrCorrupt`.  On any failure the store stays closed
    /// and nothing decrypted is retained.
    pub fn open(&mut self, password: &[u8]) -> Result<()> {
        self.ensure_not_open()?;

        let raw = format::read_vault(&self.path)?;
        format::remove_stale_temp(&self.path, STALE_TEMP_AGE);

        let salt = raw.metadata.salt_array()?;
        let nonce = raw.metadata.nonce_array()?;
        let kdf_params = raw.metadata.scrypt_params();

        let key = derive_key_with_params(password, &salt, &kdf_params)?;
        let mut plaintext = aead::open(&key, &nonce, &raw.ciphertext)?;
        let payload = PlaintextPayload::from_slice(&plaintext);
        plaintext.zeroize();
        let payload = payload?;

        info!(
            path = %self.path.display(),
            accounts = payload.accounts.len(),
            "vault opened"
        );

        self.session = Some(Session {
            key,
            salt,
            kdf_params,
            payload,
        });
        self.locked = false;
        Ok(())
    }

    /// Re-encrypt the in-memory payload under a fresh nonce and write it
    /// atomically.  The salt is kept.
    ///
    /// On failure the file on disk still holds the previous save.
    pub fn save(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(VaultError::NotOpen)?;

        write_sealed(
            &self.path,
            &session.key,
            &session.salt,
            session.kdf_params,
            &session.payload,
        )?;

        info!(
            path = %self.path.display(),
            accounts = session.payload.accounts.len(),
            "vault saved"
        );
        Ok(())
    }

    /// Discard the key and payload.  The file on disk is not touched.
    pub fn lock(&mut self) -> Result<()> {
        // Dropping the session zeroizes the key.
        if self.session.take().is_none() {
            return Err(VaultError::NotOpen);
        }
        self.locked = true;

        info!(path = %self.path.display(), "vault locked");
        Ok(())
    }

    /// Change the master password.
    ///
    /// `old_password` is checked by re-deriving against the current salt
    /// and comparing keys in constant time.  On success the whole payload
    /// is re-encrypted under a new salt, new key and new nonce.
    pub fn rotate_password(&mut self, old_password: &[u8], new_password: &[u8]) -> Result<()> {
        let path = &self.path;
        let session = self.session.as_mut().ok_or(VaultError::NotOpen)?;

        let candidate = derive_key_with_params(old_password, &session.salt, &session.kdf_params)?;
        if !candidate.ct_eq(&session.key) {
            return Err(VaultError::WrongPassword);
        }

        let new_salt = generate_salt();
        let new_key = derive_key_with_params(new_password, &new_salt, &session.kdf_params)?;

        write_sealed(
            path,
            &new_key,
            &new_salt,
            session.kdf_params,
            &session.payload,
        )?;

        // Only adopt the new key once it is safely on disk.
        session.key = new_key;
        session.salt = new_salt;

        info!(path = %path.display(), "vault password rotated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Payload access (in memory only)
    // ------------------------------------------------------------------

    /// The opaque settings object.
    pub fn get_settings(&self) -> Result<&Map<String, Value>> {
        Ok(&self.session()?.payload.settings)
    }

    /// Stage a new settings object.  Call `save()` to persist.
    pub fn set_settings(&mut self, settings: Map<String, Value>) -> Result<()> {
        self.session_mut()?.payload.settings = settings;
        Ok(())
    }

    /// The opaque account records.
    pub fn get_accounts(&self) -> Result<&[Value]> {
        Ok(&self.session()?.payload.accounts)
    }

    /// Stage a new account list.  Call `save()` to persist.
    pub fn replace_accounts(&mut self, accounts: Vec<Value>) -> Result<()> {
        self.session_mut()?.payload.accounts = accounts;
        Ok(())
    }

    /// The whole decrypted document.
    pub fn payload(&self) -> Result<&PlaintextPayload> {
        Ok(&self.session()?.payload)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns `true` while a key is held in memory.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VaultState {
        match (&self.session, self.locked) {
            (Some(_), _) => VaultState::Open,
            (None, true) => VaultState::Locked,
            (None, false) => VaultState::Closed,
        }
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a vault file exists at the path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// scrypt cost of the open vault.
    pub fn kdf_params(&self) -> Result<ScryptParams> {
        Ok(self.session()?.kdf_params)
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(VaultError::NotOpen)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(VaultError::NotOpen)
    }

    fn ensure_not_open(&self) -> Result<()> {
        if self.is_open() {
            return Err(VaultError::AlreadyOpen);
        }
        Ok(())
    }
}

/// Serialize, seal under a fresh nonce, and atomically write.
fn write_sealed(
    path: &Path,
    key: &DerivedKey,
    salt: &[u8; SALT_LEN],
    params: ScryptParams,
    payload: &PlaintextPayload,
) -> Result<()> {
    let (metadata, ciphertext) = seal_payload(key, salt, params, payload)?;
    format::write_vault(path, &metadata, &ciphertext)
}

/// Serialize and seal the payload under a fresh nonce.
fn seal_payload(
    key: &DerivedKey,
    salt: &[u8; SALT_LEN],
    params: ScryptParams,
    payload: &PlaintextPayload,
) -> Result<(VaultMetadata, Vec<u8>)> {
    let mut plaintext = payload.to_vec()?;
    let nonce = generate_nonce();
    let ciphertext = aead::seal(key, &nonce, &plaintext);
    plaintext.zeroize();

    Ok((VaultMetadata::new(salt, &nonce, params), ciphertext?))
}
