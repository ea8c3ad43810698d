//! `acctvault list` — display all accounts in a table.

use crate::cli::output;
use crate::cli::{prompt_password, vault_path, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    let password = prompt_password()?;
    let store = VaultStore::open_at(&path, password.as_bytes())?;

    let accounts = store.get_accounts()?;
    output::info(&format!("{} account(s)", accounts.len()));
    output::print_accounts_table(accounts);

    Ok(())
}
