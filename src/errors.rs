use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in AcctVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Vault lifecycle errors ---
    #[error("Vault already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Vault not found at {0}")]
    NotFound(PathBuf),

    #[error("Vault is not open")]
    NotOpen,

    #[error("Vault is already open — lock it first")]
    AlreadyOpen,

    // --- Format errors ---
    #[error("Malformed vault file: {0}")]
    MalformedFile(String),

    // --- Crypto errors ---
    /// Authentication failure on open. A wrong password and a damaged
    /// ciphertext are deliberately reported the same way.
    #[error("Could not unlock vault — wrong password or corrupted file")]
    WrongPasswordOrCorrupt,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Invalid key derivation parameters: {0}")]
    InvalidParameters(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for AcctVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
