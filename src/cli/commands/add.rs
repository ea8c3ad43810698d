//! `acctvault add` — append an account record.

use serde_json::json;

use crate::cli::output;
use crate::cli::{commit, prompt_password, vault_path, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::VaultStore;

/// Fields of a new account record, as given on the command line.
pub struct NewAccount<'a> {
    pub alias: &'a str,
    pub game: &'a str,
    pub region: &'a str,
    pub riot_id: &'a str,
    pub notes: &'a str,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, account: &NewAccount<'_>) -> Result<()> {
    let alias = account.alias.trim();
    if alias.is_empty() {
        return Err(VaultError::CommandFailed("alias cannot be empty".into()));
    }

    let path = vault_path(cli)?;
    let password = prompt_password()?;
    let mut store = VaultStore::open_at(&path, password.as_bytes())?;

    let mut accounts = store.get_accounts()?.to_vec();
    accounts.push(json!({
        "alias": alias,
        "game": account.game,
        "region": account.region,
        "riot_id": account.riot_id,
        "notes": account.notes,
    }));

    store.replace_accounts(accounts)?;
    commit(&mut store)?;

    output::success(&format!("Added account '{alias}'"));
    Ok(())
}
