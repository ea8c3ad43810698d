//! `acctvault remove` — delete account records by alias.

use dialoguer::Confirm;
use serde_json::Value;

use crate::cli::output;
use crate::cli::{commit, prompt_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Execute the `remove` command.
pub fn execute(cli: &Cli, alias: &str, force: bool) -> Result<()> {
    let path = vault_path(cli)?;

    // Unless --force is set, ask for confirmation before removing.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove account '{alias}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let password = prompt_password()?;
    let mut store = VaultStore::open_at(&path, password.as_bytes())?;

    let (kept, removed) = partition_by_alias(store.get_accounts()?, alias);
    if removed == 0 {
        return Err(VaultError::CommandFailed(format!(
            "no account with alias '{alias}'"
        )));
    }

    store.replace_accounts(kept)?;
    commit(&mut store)?;

    output::success(&format!("Removed {removed} account(s) named '{alias}'"));
    Ok(())
}

/// Split off records whose `alias` equals `alias`; returns the rest and
/// how many were dropped.
fn partition_by_alias(accounts: &[Value], alias: &str) -> (Vec<Value>, usize) {
    let kept: Vec<Value> = accounts
        .iter()
        .filter(|a| a.get("alias").and_then(Value::as_str) != Some(alias))
        .cloned()
        .collect();
    let removed = accounts.len() - kept.len();
    (kept, removed)
}
