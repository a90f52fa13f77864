//! Tally CLI - Personal finance tracker
//!
//! Usage:
//!   tally init                Initialize database
//!   tally import --file CSV   Import transactions
//!   tally serve --port 3000   Start web server
//!   tally run-jobs            Run the notification jobs once

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve { port, host } => commands::cmd_serve(&cli.db, &host, port).await,
        Commands::Import { file, user } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, user, &file)
        }
        Commands::Export { output, user } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_export(&db, user, output.as_deref())
        }
        Commands::ApplyRecurring => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_apply_recurring(&db)
        }
        Commands::RunJobs { which } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_run_jobs(&db, &which)
        }
        Commands::SampleData { username } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_sample_data(&db, &username)
        }
        Commands::Status => commands::cmd_status(&cli.db),
    }
}
