//! One module per subcommand.  Each exposes `execute`.

pub mod add;
pub mod export;
pub mod import_cmd;
pub mod init;
pub mod inspect;
pub mod list;
pub mod remove;
pub mod rotate;
pub mod settings_cmd;
