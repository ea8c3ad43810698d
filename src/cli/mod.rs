//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::config::{app_dir, Settings};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Minimum length for a newly chosen password.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the current vault password (scripted use).
pub const PASSWORD_ENV: &str = "ACCTVAULT_PASSWORD";

/// Environment variable holding the new password for `rotate-password`.
pub const NEW_PASSWORD_ENV: &str = "ACCTVAULT_NEW_PASSWORD";

/// AcctVault CLI: password-protected store for game account records.
#[derive(Parser)]
#[command(
    name = "acctvault",
    about = "Encrypted local vault for game accounts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: <app dir>/vault.dat, or `vault_file` from acctvault.toml)
    #[arg(long, global = true, env = "ACCTVAULT_VAULT")]
    pub vault: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Show file details and a summary of the vault contents
    Inspect,

    /// List stored accounts
    List,

    /// Add an account record
    Add {
        /// Display name for the account
        #[arg(long)]
        alias: String,
        /// Game (e.g. Valorant, League of Legends)
        #[arg(long)]
        game: String,
        /// Server region (e.g. eu, na)
        #[arg(long, default_value = "")]
        region: String,
        /// Riot ID in Name#TAG form
        #[arg(long, default_value = "")]
        riot_id: String,
        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove every account with the given alias
    Remove {
        /// Alias of the account to remove
        alias: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show or change stored application settings
    Settings {
        /// Set a value: KEY=VALUE (VALUE parsed as JSON, else kept as a string)
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Change the vault's master password
    RotatePassword,

    /// Copy the encrypted vault file to a backup location
    Export {
        /// Destination file
        dest: PathBuf,
        /// Overwrite the destination if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Replace the vault with a previously exported backup
    Import {
        /// Backup file to restore
        src: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault password, trying in order:
/// 1. `ACCTVAULT_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation.
///
/// `env_var` is consulted first for scripted usage.  Enforces a minimum
/// password length.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        check_password_len(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault password")
                .with_confirmation(
                    "Confirm vault password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if check_password_len(&password).is_err() {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn check_password_len(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VaultError::CommandFailed(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Resolve the vault file from `--vault`, else from the settings file.
pub fn vault_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.vault {
        return Ok(path.clone());
    }
    let dir = app_dir()?;
    let settings = Settings::load(&dir)?;
    Ok(settings.vault_path(&dir))
}

/// Persist staged changes.  On failure the previous file is intact and
/// the user is told nothing was written.
pub fn commit(store: &mut VaultStore) -> Result<()> {
    store.save().map_err(|e| {
        output::warning("Changes not saved; the vault file is unchanged.");
        e
    })
}

/// Split `KEY=VALUE`.  VALUE is parsed as JSON when possible so numbers,
/// booleans and objects keep their type; anything else becomes a string.
pub fn parse_setting(arg: &str) -> Result<(String, Value)> {
    let (key, raw) = arg.split_once('=').ok_or_else(|| {
        VaultError::CommandFailed(format!("expected KEY=VALUE, got '{arg}'"))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(VaultError::CommandFailed(
            "setting name cannot be empty".into(),
        ));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_setting_keeps_json_types() {
        assert_eq!(parse_setting("a=1").unwrap(), ("a".into(), json!(1)));
        assert_eq!(parse_setting("b=true").unwrap(), ("b".into(), json!(true)));
        assert_eq!(
            parse_setting("c={\"x\":2}").unwrap(),
            ("c".into(), json!({"x": 2}))
        );
    }

    #[test]
    fn parse_setting_falls_back_to_string() {
        assert_eq!(
            parse_setting("default_region=eu").unwrap(),
            ("default_region".into(), json!("eu"))
        );
    }

    #[test]
    fn parse_setting_splits_on_first_equals() {
        assert_eq!(
            parse_setting("url=https://x/?a=b").unwrap(),
            ("url".into(), json!("https://x/?a=b"))
        );
    }

    #[test]
    fn parse_setting_rejects_missing_equals() {
        assert!(parse_setting("novalue").is_err());
        assert!(parse_setting("=1").is_err());
    }

    #[test]
    fn short_passwords_rejected() {
        assert!(check_password_len("short").is_err());
        assert!(check_password_len("p@ss1234").is_ok());
    }

    #[test]
    fn explicit_vault_flag_wins() {
        let cli = Cli::parse_from(["acctvault", "--vault", "/tmp/x.dat", "list"]);
        assert_eq!(vault_path(&cli).unwrap(), PathBuf::from("/tmp/x.dat"));
    }
}
