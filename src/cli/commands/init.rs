//! `acctvault init` — create a new vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, vault_path, Cli, PASSWORD_ENV};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    if path.exists() {
        output::tip("Use `acctvault add` to add accounts to the existing vault.");
        return Err(VaultError::AlreadyExists(path));
    }

    let password = prompt_new_password(PASSWORD_ENV)?;
    VaultStore::create_at(&path, password.as_bytes())?;

    output::success(&format!("Vault created at {}", path.display()));
    output::tip("Run `acctvault add --alias <name> --game <game>` to add an account.");
    output::tip("Run `acctvault list` to see all accounts.");

    Ok(())
}
