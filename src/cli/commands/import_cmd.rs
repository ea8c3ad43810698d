//! `acctvault import` — restore the vault from an exported backup.
//!
//! The backup is checked for a well-formed container before it replaces
//! the current vault.  The replacement is atomic.

use std::fs;
use std::path::Path;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::format;

/// Execute the `import` command.
pub fn execute(cli: &Cli, src: &Path, force: bool) -> Result<()> {
    let path = vault_path(cli)?;

    if !src.exists() {
        return Err(VaultError::CommandFailed(format!(
            "backup file not found: {}",
            src.display()
        )));
    }

    let bytes = fs::read(src)?;
    format::decode(&bytes)?;

    if path.exists() && !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Replace the vault at {} with this backup?",
                path.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            return Err(VaultError::UserCancelled);
        }
    }

    format::write_bytes_atomic(&path, &bytes)?;

    output::success(&format!("Vault restored from {}", src.display()));
    output::tip("The restored vault uses the password it was exported with.");
    Ok(())
}
