//! `acctvault rotate-password` — change the vault master password.
//!
//! Opens the vault with the current password, then re-encrypts the full
//! payload under a new salt and key derived from the new password.

use crate::cli::output;
use crate::cli::{prompt_new_password, prompt_password, vault_path, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `rotate-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    // 1. Open the vault with the current password.
    output::info("Enter your current vault password.");
    let old_password = prompt_password()?;
    let mut store = VaultStore::open_at(&path, old_password.as_bytes())?;

    // 2. Prompt for the new password.
    output::info("Choose your new vault password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    // 3. Re-key and write atomically.
    store
        .rotate_password(old_password.as_bytes(), new_password.as_bytes())
        .map_err(|e| {
            output::warning("Password not changed; the vault file is unchanged.");
            e
        })?;

    output::success(&format!(
        "Password changed ({} account(s) re-encrypted)",
        store.get_accounts()?.len()
    ));

    Ok(())
}
