use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use acctvault::cli::commands::add::NewAccount;
use acctvault::cli::{Cli, Commands};
use acctvault::config::{app_dir, Settings};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "ACCTVAULT_LOG";

fn main() {
    let cli = Cli::parse();

    init_logging();

    let result = match cli.command {
        Commands::Init => acctvault::cli::commands::init::execute(&cli),
        Commands::Inspect => acctvault::cli::commands::inspect::execute(&cli),
        Commands::List => acctvault::cli::commands::list::execute(&cli),
        Commands::Add {
            ref alias,
            ref game,
            ref region,
            ref riot_id,
            ref notes,
        } => acctvault::cli::commands::add::execute(
            &cli,
            &NewAccount {
                alias,
                game,
                region,
                riot_id,
                notes,
            },
        ),
        Commands::Remove { ref alias, force } => {
            acctvault::cli::commands::remove::execute(&cli, alias, force)
        }
        Commands::Settings { ref set } => acctvault::cli::commands::settings_cmd::execute(&cli, set),
        Commands::RotatePassword => acctvault::cli::commands::rotate::execute(&cli),
        Commands::Export { ref dest, force } => {
            acctvault::cli::commands::export::execute(&cli, dest, force)
        }
        Commands::Import { ref src, force } => {
            acctvault::cli::commands::import_cmd::execute(&cli, src, force)
        }
    };

    if let Err(e) = result {
        acctvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr.  `ACCTVAULT_LOG` wins over `log_level` in the settings
/// file; an unparsable filter falls back to `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = app_dir()
            .and_then(|dir| Settings::load(&dir))
            .map(|s| s.log_level)
            .unwrap_or_else(|_| Settings::default().log_level);
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
