//! `acctvault export` — copy the encrypted vault file to a backup path.
//!
//! The copy stays encrypted; no password is needed.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::format;

/// Execute the `export` command.
pub fn execute(cli: &Cli, dest: &Path, force: bool) -> Result<()> {
    let path = vault_path(cli)?;

    // Refuse to export onto the vault itself.
    if dest == path
        || fs::canonicalize(dest).ok().is_some_and(|d| fs::canonicalize(&path).ok() == Some(d))
    {
        return Err(VaultError::CommandFailed(
            "export destination is the vault itself".into(),
        ));
    }

    if dest.exists() && !force {
        return Err(VaultError::CommandFailed(format!(
            "{} already exists (use --force to overwrite)",
            dest.display()
        )));
    }

    // Validate before copying so a damaged vault is not silently backed up.
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::NotFound(path));
        }
        Err(e) => return Err(e.into()),
    };
    format::decode(&bytes)?;

    format::write_bytes_atomic(dest, &bytes)?;

    output::success(&format!("Vault exported to {}", dest.display()));
    Ok(())
}
