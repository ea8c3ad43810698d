//! `acctvault inspect` — diagnose a vault file.
//!
//! Prints file size, modification time and the cleartext metadata, then
//! unlocks the vault and summarises what is inside.

use std::fs;
use std::io;

use chrono::{DateTime, Local};

use crate::cli::output::{self, account_field};
use crate::cli::{prompt_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{format, VaultStore};

/// Number of accounts shown in the preview.
const PREVIEW_LEN: usize = 3;

/// Execute the `inspect` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(VaultError::NotFound(path));
        }
        Err(e) => return Err(e.into()),
    };
    let modified: DateTime<Local> = meta.modified()?.into();

    output::info(&format!("File: {}", path.display()));
    println!(
        "    Size: {} bytes, modified: {}",
        meta.len(),
        modified.format("%Y-%m-%d %H:%M:%S")
    );

    let raw = format::read_vault(&path)?;
    let params = raw.metadata.scrypt_params();
    println!(
        "    Format v{}, kdf: {} (N=2^{}, r={}, p={}), ciphertext: {} bytes",
        raw.metadata.version,
        raw.metadata.kdf,
        params.log_n,
        params.r,
        params.p,
        raw.ciphertext.len()
    );

    let password = prompt_password()?;
    let store = VaultStore::open_at(&path, password.as_bytes())?;
    let payload = store.payload()?;

    let mut keys = vec!["version", "settings", "accounts"];
    keys.extend(payload.extra.keys().map(String::as_str));
    output::success("Unlocked.");
    println!("    Payload v{}, keys: {}", payload.version, keys.join(", "));
    println!("    settings: {} entries", payload.settings.len());
    println!("    accounts: {} entries", payload.accounts.len());

    for (i, account) in payload.accounts.iter().take(PREVIEW_LEN).enumerate() {
        println!(
            "     [{}] {}  {}  {}",
            i + 1,
            account_field(account, "alias"),
            account_field(account, "game"),
            account_field(account, "riot_id")
        );
    }

    Ok(())
}
