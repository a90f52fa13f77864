//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Track your money, keep your balances honest
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Self-hosted personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database with a default user and categories
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Import transactions from CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// User to import for
        #[arg(short, long, default_value = "1")]
        user: i64,
    },

    /// Export transactions to CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// User to export
        #[arg(short, long, default_value = "1")]
        user: i64,
    },

    /// Apply due recurring rules, catching up missed periods
    ApplyRecurring,

    /// Run the notification jobs once
    RunJobs {
        /// Which batch to run: hourly, daily, all
        #[arg(short, long, default_value = "all")]
        which: String,
    },

    /// Populate the database with sample data for testing
    SampleData {
        /// Username for the sample user
        #[arg(long, default_value = "testuser")]
        username: String,
    },

    /// Show database status and per-user summaries
    Status,
}
