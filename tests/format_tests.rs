//! Integration tests for the vault file container and atomic writes.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use acctvault::crypto::{ScryptParams, NONCE_LEN, SALT_LEN};
use acctvault::errors::VaultError;
use acctvault::vault::format::{self, VaultMetadata};
use tempfile::TempDir;

fn metadata() -> VaultMetadata {
    VaultMetadata::new(&[5u8; SALT_LEN], &[6u8; NONCE_LEN], ScryptParams::default())
}

#[test]
fn write_then_read_preserves_parts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");

    format::write_vault(&path, &metadata(), b"opaque ciphertext").unwrap();
    let raw = format::read_vault(&path).unwrap();

    assert_eq!(raw.metadata, metadata());
    assert_eq!(raw.ciphertext, b"opaque ciphertext");
    assert!(format::temp_files(&path).is_empty());
}

#[test]
fn read_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = format::read_vault(&dir.path().join("absent.dat")).unwrap_err();
    assert!(matches!(err, VaultError::NotFound(_)));
}

#[test]
fn metadata_missing_nonce_is_malformed() {
    let meta = br#"{"version":1,"kdf":"scrypt","salt":"AAAAAAAAAAAAAAAAAAAAAA=="}"#;
    let mut data = (meta.len() as u32).to_be_bytes().to_vec();
    data.extend_from_slice(meta);
    data.extend_from_slice(&[0u8; 32]);

    assert!(matches!(
        format::decode(&data),
        Err(VaultError::MalformedFile(_))
    ));
}

#[test]
fn metadata_with_bad_base64_is_malformed() {
    let meta = br#"{"version":1,"kdf":"scrypt","salt":"!!!","nonce":"AAAAAAAAAAAAAAAA"}"#;
    let mut data = (meta.len() as u32).to_be_bytes().to_vec();
    data.extend_from_slice(meta);

    assert!(matches!(
        format::decode(&data),
        Err(VaultError::MalformedFile(_))
    ));
}

#[test]
fn unsupported_version_is_malformed() {
    let mut meta = metadata();
    meta.version = 2;
    let bytes = format::encode(&meta, b"x").unwrap();
    assert!(matches!(
        format::decode(&bytes),
        Err(VaultError::MalformedFile(_))
    ));
}

#[test]
fn atomic_write_replaces_whole_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    fs::write(&path, vec![0xEE; 4096]).unwrap();

    format::write_bytes_atomic(&path, b"short").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"short");
}

#[test]
fn stale_temp_is_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    let tmp = format::stage_bytes(&path, b"leftover").unwrap();

    assert_eq!(format::remove_stale_temp(&path, Duration::ZERO), 1);
    assert!(!tmp.exists());
    assert_eq!(format::remove_stale_temp(&path, Duration::ZERO), 0);
}

#[test]
fn fresh_temp_survives_cleanup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    let tmp = format::stage_bytes(&path, b"in flight").unwrap();

    assert_eq!(format::remove_stale_temp(&path, Duration::from_secs(60)), 0);
    assert!(tmp.exists());
}

#[test]
fn legacy_fixed_temp_name_is_cleaned_up() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    let legacy = dir.path().join(".vault.dat.tmp");
    fs::write(&legacy, b"old").unwrap();
    fs::write(dir.path().join("notes.tmp"), b"unrelated").unwrap();

    assert_eq!(format::remove_stale_temp(&path, Duration::ZERO), 1);
    assert!(!legacy.exists());
    assert!(dir.path().join("notes.tmp").exists());
}

#[test]
fn each_stage_gets_its_own_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");

    let first = format::stage_bytes(&path, b"first").unwrap();
    let second = format::stage_bytes(&path, b"second").unwrap();

    assert_ne!(first, second);
    assert_eq!(fs::read(&first).unwrap(), b"first");
    assert_eq!(fs::read(&second).unwrap(), b"second");
    assert_eq!(format::temp_files(&path).len(), 2);
}

#[test]
fn concurrent_writers_never_tear_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    let big_a = vec![b'A'; 2 << 20];
    let big_b = vec![b'B'; 3 << 19];
    format::write_bytes_atomic(&path, &big_a).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let writers: Vec<_> = [big_a.clone(), big_b.clone()]
        .into_iter()
        .map(|bytes| {
            let path = path.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    format::write_bytes_atomic(&path, &bytes).unwrap();
                }
            })
        })
        .collect();

    for _ in 0..200 {
        let seen = fs::read(&path).unwrap();
        assert!(
            seen == big_a || seen == big_b,
            "torn read of {} bytes",
            seen.len()
        );
    }
    done.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
    assert!(format::temp_files(&path).is_empty());
}

#[test]
fn create_vault_refuses_to_replace() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    fs::write(&path, b"someone else's vault").unwrap();

    let err = format::create_vault(&path, &metadata(), b"ct").unwrap_err();
    assert!(matches!(err, VaultError::AlreadyExists(_)));
    assert_eq!(fs::read(&path).unwrap(), b"someone else's vault");
    assert!(format::temp_files(&path).is_empty());
}

fn with_kdf_params(kdf_params: serde_json::Value) -> Vec<u8> {
    let meta = serde_json::json!({
        "version": 1,
        "kdf": "scrypt",
        "salt": "AAAAAAAAAAAAAAAAAAAAAA==",
        "nonce": "AAAAAAAAAAAAAAAA",
        "kdf_params": kdf_params,
    });
    let meta = serde_json::to_vec(&meta).unwrap();
    let mut data = (meta.len() as u32).to_be_bytes().to_vec();
    data.extend_from_slice(&meta);
    data.extend_from_slice(&[0u8; 32]);
    data
}

#[test]
fn out_of_range_kdf_params_are_malformed() {
    for params in [
        serde_json::json!({"log_n": 40, "r": 8, "p": 1}),
        serde_json::json!({"log_n": 9, "r": 8, "p": 1}),
        serde_json::json!({"log_n": 15, "r": 8, "p": 2000}),
        serde_json::json!({"log_n": 15, "r": 0, "p": 1}),
        serde_json::json!({"log_n": 20, "r": 32, "p": 1}),
    ] {
        let data = with_kdf_params(params.clone());
        assert!(
            matches!(format::decode(&data), Err(VaultError::MalformedFile(_))),
            "accepted {params}"
        );
    }
}

#[test]
fn default_kdf_params_are_accepted() {
    let data = with_kdf_params(serde_json::json!({"log_n": 15, "r": 8, "p": 1}));
    let raw = format::decode(&data).unwrap();
    assert_eq!(raw.metadata.scrypt_params(), ScryptParams::default());
}

#[cfg(unix)]
#[test]
fn vault_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.dat");
    format::write_vault(&path, &metadata(), b"ct").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
