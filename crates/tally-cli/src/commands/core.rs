//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Default categories seeded by `tally init`
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Education",
    "Travel",
    "Home & Garden",
    "Personal Care",
    "Insurance",
    "Gifts & Donations",
    "Salary",
    "Freelance",
    "Investment Returns",
    "Other Income",
    "Other Expenses",
];

/// Open the database, running migrations
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    tracing::debug!(path = path_str, "Opening database");
    Database::new(path_str).context("Failed to open database")
}

/// Seed the default category set, skipping names that already exist
pub fn seed_default_categories(db: &Database) -> Result<usize> {
    let before = db.list_categories()?.len();
    for name in DEFAULT_CATEGORIES {
        db.get_or_create_category(name)?;
    }
    Ok(db.list_categories()?.len() - before)
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    let user_id = db.upsert_user("user", None)?;
    println!("   Default user ready (id {})", user_id);

    let seeded = seed_default_categories(&db)?;
    if seeded > 0 {
        println!("   Seeded {} default categories", seeded);
    } else {
        println!("   Categories already exist, skipping");
    }

    println!("Database initialized.");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: tally import --file transactions.csv");
    println!("  2. Start the web UI:    tally serve");

    Ok(())
}
