//! # Pharmacy CLI Entry Point
//!
//! The actual setup is in lib.rs so the commands stay testable.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pharmacy_cli::run().await
}
