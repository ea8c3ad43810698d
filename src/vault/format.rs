//! On-disk vault container and the atomic write protocol.
//!
//! A vault file has this layout:
//!
//! ```text
//! [metadata_len: 4 bytes BE][metadata JSON][AES-GCM ciphertext + tag]
//! ```
//!
//! - **Metadata length**: big-endian u32, the size of the JSON block.
//! - **Metadata JSON**: serialized `VaultMetadata`, everything needed to
//!   re-derive the key and decrypt except the password.
//! - **Ciphertext**: the sealed payload, running to end of file.
//!
//! The metadata block is not authenticated.  A damaged salt or nonce
//! yields the wrong key or nonce, and the open then fails the GCM tag
//! check like any other corruption.  A recorded scrypt cost outside the
//! accepted range is rejected as malformed before any derivation runs.
//!
//! Every write goes to its own `.<name>.<random>.tmp` sibling, which is
//! then renamed over the target.  Concurrent writers never share a temp
//! file, so the last rename wins with a whole file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::crypto::{ScryptParams, KDF_NAME, NONCE_LEN, SALT_LEN};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current container format version.
pub const CURRENT_VERSION: u32 = 1;

/// Size of the big-endian metadata length prefix.
const LEN_PREFIX: usize = 4;

/// Suffix of every temp file written next to a vault.
const TEMP_SUFFIX: &str = ".tmp";

// ---------------------------------------------------------------------------
// VaultMetadata
// ---------------------------------------------------------------------------

/// Cleartext metadata stored ahead of the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    /// Container format version.
    pub version: u32,

    /// KDF identifier, always `"scrypt"` for version 1.
    pub kdf: String,

    /// The 16-byte KDF salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// The 12-byte nonce of the ciphertext that follows (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// scrypt cost used for this vault.  Absent in files written before
    /// the cost was recorded; those use the version 1 defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_params: Option<ScryptParams>,
}

impl VaultMetadata {
    /// Build metadata for a fresh save.
    pub fn new(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], params: ScryptParams) -> Self {
        Self {
            version: CURRENT_VERSION,
            kdf: KDF_NAME.to_string(),
            salt: salt.to_vec(),
            nonce: nonce.to_vec(),
            kdf_params: Some(params),
        }
    }

    /// The KDF salt as a fixed-size array.
    pub fn salt_array(&self) -> Result<[u8; SALT_LEN]> {
        <[u8; SALT_LEN]>::try_from(self.salt.as_slice()).map_err(|_| {
            VaultError::MalformedFile(format!(
                "salt must be {SALT_LEN} bytes (got {})",
                self.salt.len()
            ))
        })
    }

    /// The nonce as a fixed-size array.
    pub fn nonce_array(&self) -> Result<[u8; NONCE_LEN]> {
        <[u8; NONCE_LEN]>::try_from(self.nonce.as_slice()).map_err(|_| {
            VaultError::MalformedFile(format!(
                "nonce must be {NONCE_LEN} bytes (got {})",
                self.nonce.len()
            ))
        })
    }

    /// The scrypt cost to re-derive with.
    pub fn scrypt_params(&self) -> ScryptParams {
        self.kdf_params.unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.version != CURRENT_VERSION {
            return Err(VaultError::MalformedFile(format!(
                "unsupported version {}, expected {CURRENT_VERSION}",
                self.version
            )));
        }
        if self.kdf != KDF_NAME {
            return Err(VaultError::MalformedFile(format!(
                "unsupported kdf '{}'",
                self.kdf
            )));
        }
        self.salt_array()?;
        self.nonce_array()?;
        if let Some(params) = &self.kdf_params {
            params
                .check()
                .map_err(|e| VaultError::MalformedFile(format!("kdf_params: {e}")))?;
        }
        Ok(())
    }
}

/// A decoded vault file.
#[derive(Debug, Clone)]
pub struct RawVault {
    pub metadata: VaultMetadata,
    /// Ciphertext and tag, exactly as stored.
    pub ciphertext: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize metadata + ciphertext into the on-disk byte layout.
pub fn encode(metadata: &VaultMetadata, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let meta_bytes = serde_json::to_vec(metadata)
        .map_err(|e| VaultError::Serialization(format!("metadata: {e}")))?;

    let meta_len = u32::try_from(meta_bytes.len()).map_err(|_| {
        VaultError::Serialization(format!(
            "metadata length {} exceeds u32::MAX",
            meta_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(LEN_PREFIX + meta_bytes.len() + ciphertext.len());
    buf.extend_from_slice(&meta_len.to_be_bytes()); // 4 bytes BE
    buf.extend_from_slice(&meta_bytes); // metadata JSON
    buf.extend_from_slice(ciphertext); // sealed payload
    Ok(buf)
}

/// Parse the on-disk byte layout.
///
/// Fails with `MalformedFile` when the prefix is missing or points past
/// the end of the data, or the metadata is not a valid version 1 block.
pub fn decode(data: &[u8]) -> Result<RawVault> {
    if data.len() < LEN_PREFIX {
        return Err(VaultError::MalformedFile(
            "file too small to be a vault".into(),
        ));
    }

    let (prefix, rest) = data.split_at(LEN_PREFIX);
    let meta_len_u32 = u32::from_be_bytes(
        prefix
            .try_into()
            .map_err(|_| VaultError::MalformedFile("bad metadata length".into()))?,
    );
    let meta_len = usize::try_from(meta_len_u32).map_err(|_| {
        VaultError::MalformedFile(format!(
            "metadata length {meta_len_u32} exceeds platform address space"
        ))
    })?;

    if meta_len > rest.len() {
        return Err(VaultError::MalformedFile(
            "metadata length exceeds file size".into(),
        ));
    }

    let (meta_bytes, ciphertext) = rest.split_at(meta_len);
    let metadata: VaultMetadata = serde_json::from_slice(meta_bytes)
        .map_err(|e| VaultError::MalformedFile(format!("metadata JSON: {e}")))?;
    metadata.validate()?;

    Ok(RawVault {
        metadata,
        ciphertext: ciphertext.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read and decode a vault file.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(VaultError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    decode(&data)
}

/// Encode and write a vault file to disk **atomically**.
pub fn write_vault(path: &Path, metadata: &VaultMetadata, ciphertext: &[u8]) -> Result<()> {
    let bytes = encode(metadata, ciphertext)?;
    write_bytes_atomic(path, &bytes)
}

/// Encode and write a vault file that must not exist yet.
///
/// Same protocol as `write_vault`, but the final rename refuses to
/// replace anything already at `path` and fails with `AlreadyExists`.
pub fn create_vault(path: &Path, metadata: &VaultMetadata, ciphertext: &[u8]) -> Result<()> {
    let bytes = encode(metadata, ciphertext)?;
    let tmp = write_temp(path, &bytes)?;
    tmp.persist_noclobber(path).map_err(|e| match e.error.kind() {
        io::ErrorKind::AlreadyExists => VaultError::AlreadyExists(path.to_path_buf()),
        _ => VaultError::Io(e.error),
    })?;
    sync_parent_dir(path);
    Ok(())
}

/// Encode a vault and write it to a temp file only, without replacing
/// the destination.  Returns the temp path for `commit_staged`.
pub fn stage_vault(path: &Path, metadata: &VaultMetadata, ciphertext: &[u8]) -> Result<PathBuf> {
    let bytes = encode(metadata, ciphertext)?;
    stage_bytes(path, &bytes)
}

/// Replace `path` with `bytes` as one indivisible step.
///
/// 1. Write to a fresh temp file in the same directory and fsync it.
/// 2. Rename the temp file over the target path.
///
/// Readers see either the old file or the new one, never a mix.  If
/// anything fails the destination is left untouched and the temp file
/// is removed.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = write_temp(path, bytes)?;
    tmp.persist(path).map_err(|e| VaultError::Io(e.error))?;
    sync_parent_dir(path);
    Ok(())
}

/// Write `bytes` to a new temp file for `path`, flushed to stable
/// storage, and leave it on disk.
pub fn stage_bytes(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let tmp = write_temp(path, bytes)?;
    tmp.into_temp_path()
        .keep()
        .map_err(|e| VaultError::Io(e.error))
}

/// Rename a staged temp file over `path`.
pub fn commit_staged(tmp_path: &Path, path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(tmp_path, path) {
        let _ = fs::remove_file(tmp_path);
        return Err(e.into());
    }
    sync_parent_dir(path);
    Ok(())
}

/// Temp files currently sitting next to `path`.
pub fn temp_files(path: &Path) -> Vec<PathBuf> {
    let prefix = temp_prefix(path);
    let Ok(entries) = fs::read_dir(parent_dir(path)) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(TEMP_SUFFIX)
        })
        .map(|entry| entry.path())
        .collect()
}

/// Delete temp files left behind by interrupted writes.
///
/// Only files last modified at least `min_age` ago are removed, so the
/// temp file of a save still in progress elsewhere is left alone.
/// Returns how many were removed.
pub fn remove_stale_temp(path: &Path, min_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;
    for tmp_path in temp_files(path) {
        let age = fs::metadata(&tmp_path)
            .and_then(|m| m.modified())
            .map(|modified| now.duration_since(modified).unwrap_or_default());
        if !matches!(age, Ok(age) if age >= min_age) {
            continue;
        }
        match fs::remove_file(&tmp_path) {
            Ok(()) => {
                debug!(path = %tmp_path.display(), "removed stale temp file");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %tmp_path.display(), error = %e, "could not remove stale temp file");
            }
        }
    }
    removed
}

/// `.<name>.`: the name prefix shared by temp files for `path`.
fn temp_prefix(path: &Path) -> String {
    format!(
        ".{}.",
        path.file_name().unwrap_or_default().to_string_lossy()
    )
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Create a uniquely named temp file next to `path` holding `bytes`.
///
/// tempfile creates it owner-only (0600 on Unix) and removes it again
/// if it is dropped before being persisted.
fn write_temp(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(&temp_prefix(path))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Make the rename itself durable.  Best effort: not every platform
/// allows opening a directory.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        if let Ok(dir) = fs::File::open(parent_dir(path)) {
            let _ = dir.sync_all();
        }
    }

    #[cfg(not(unix))]
    let _ = path;
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
