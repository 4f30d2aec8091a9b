//! # Pharmacy Back-Office CLI
//!
//! Command-line front end over `pharmacy-core` and `pharmacy-db`.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Parse the command line
//! 3. Load settings from the environment
//! 4. Determine database path (flag, env, app data directory)
//! 5. Connect to database & run migrations
//! 6. Run the command and print its result
//!
//! ## Exit Codes
//! ```text
//! 0  success          4  conflict (duplicate)
//! 1  other failure    5  not logged in / wrong password
//! 2  invalid input    6  permission denied
//! 3  not found
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::{Context, Credentials};
use config::AppConfig;
use error::CliResult;
use output::Output;
use pharmacy_db::{Database, DbConfig};

/// Parses the command line, runs it and maps the outcome to an exit code.
pub async fn run() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let out = Output::new(cli.json);

    match run_cli(cli, &out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(code = ?err.code, "Command failed");
            out.emit_error(&err);
            err.exit_code()
        }
    }
}

async fn run_cli(cli: Cli, out: &Output) -> CliResult<()> {
    let config = AppConfig::from_env();
    let db_path = config.resolve_database_path(cli.db)?;
    info!(path = %db_path.display(), "Opening database");

    let db = Database::new(DbConfig::new(db_path)).await?;

    let credentials = match (cli.user, cli.password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    };

    let ctx = Context::new(db, config, credentials);
    let result = commands::execute(&ctx, cli.command, out).await;
    ctx.db.close().await;
    result
}

/// Initializes the tracing subscriber. Logs go to stderr so that stdout
/// carries only command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=pharmacy=trace` - Show trace for pharmacy crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharmacy=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
