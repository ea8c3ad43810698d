//! `acctvault settings` — show or update the settings object stored in
//! the vault.

use crate::cli::output;
use crate::cli::{commit, parse_setting, prompt_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Execute the `settings` command.
pub fn execute(cli: &Cli, assignments: &[String]) -> Result<()> {
    // Parse everything before prompting so typos fail fast.
    let parsed = assignments
        .iter()
        .map(|a| parse_setting(a))
        .collect::<Result<Vec<_>>>()?;

    let path = vault_path(cli)?;
    let password = prompt_password()?;
    let mut store = VaultStore::open_at(&path, password.as_bytes())?;

    if parsed.is_empty() {
        let pretty = serde_json::to_string_pretty(store.get_settings()?)
            .map_err(|e| VaultError::Serialization(format!("settings: {e}")))?;
        println!("{pretty}");
        return Ok(());
    }

    let mut settings = store.get_settings()?.clone();
    let count = parsed.len();
    for (key, value) in parsed {
        settings.insert(key, value);
    }

    store.set_settings(settings)?;
    commit(&mut store)?;

    output::success(&format!("Updated {count} setting(s)"));
    Ok(())
}
