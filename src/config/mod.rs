//! Application configuration (`acctvault.toml`).

pub mod settings;

pub use settings::{app_dir, Settings};
