use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Environment variable that overrides the application directory.
pub const HOME_ENV: &str = "ACCTVAULT_HOME";

/// Application directory name under the user's home.
const APP_DIR_NAME: &str = ".riot_acct_mgr";

/// Application configuration, loaded from `<app_dir>/acctvault.toml`.
///
/// Every field has a sensible default so AcctVault works out-of-the-box
/// without any config file at all.  The KDF cost is deliberately absent:
/// it is fixed per vault format version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file, relative to the app directory unless absolute.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// `tracing` filter used when `ACCTVAULT_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "vault.dat".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the app directory.
    const FILE_NAME: &'static str = "acctvault.toml";

    /// Load settings from `<app_dir>/acctvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let config_path = app_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the vault file.
    ///
    /// Example: `~/.riot_acct_mgr/vault.dat`
    pub fn vault_path(&self, app_dir: &Path) -> PathBuf {
        app_dir.join(&self.vault_file)
    }
}

/// Resolve the application directory.
///
/// `ACCTVAULT_HOME` wins; otherwise `~/.riot_acct_mgr`.
pub fn app_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            VaultError::ConfigError(format!(
                "cannot locate home directory — set {HOME_ENV}"
            ))
        })?;

    Ok(PathBuf::from(home).join(APP_DIR_NAME))
}

// ── Tests ────────────────────────────────────────────────────────────
