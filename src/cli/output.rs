//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;
use serde_json::Value;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Read a display field from an opaque account record.
///
/// Records are free-form JSON; anything missing or non-scalar shows
/// as `?`.
pub fn account_field(account: &Value, field: &str) -> String {
    match account.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "?".to_string(),
    }
}

/// Print a table of account records (Alias, Game, Region, Riot ID).
pub fn print_accounts_table(accounts: &[Value]) {
    if accounts.is_empty() {
        info("No accounts in this vault yet.");
        tip("Run `acctvault add --alias <name> --game <game>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Alias", "Game", "Region", "Riot ID"]);

    for a in accounts {
        table.add_row(vec![
            account_field(a, "alias"),
            account_field(a, "game"),
            account_field(a, "region"),
            account_field(a, "riot_id"),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_field_reads_scalars() {
        let a = json!({"alias": "main", "rr": 42, "smurf": false});
        assert_eq!(account_field(&a, "alias"), "main");
        assert_eq!(account_field(&a, "rr"), "42");
        assert_eq!(account_field(&a, "smurf"), "false");
    }

    #[test]
    fn account_field_placeholder_for_missing_or_empty() {
        let a = json!({"alias": "", "tags": ["x"]});
        assert_eq!(account_field(&a, "alias"), "?");
        assert_eq!(account_field(&a, "tags"), "?");
        assert_eq!(account_field(&a, "game"), "?");
        assert_eq!(account_field(&json!("not an object"), "alias"), "?");
    }
}
