//! CSV import and export command implementations

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tally_core::db::Database;

pub fn cmd_import(db: &Database, user_id: i64, file: &Path) -> Result<()> {
    println!("Importing transactions from {}...", file.display());

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    let today = Utc::now().date_naive();
    let summary = tally_core::export::import_csv(db, user_id, csv_file, today)?;

    println!("   Imported:  {}", summary.imported);
    println!("   Splits:    {}", summary.splits);
    if summary.skipped > 0 {
        println!("   Skipped:   {} (malformed rows)", summary.skipped);
    }

    Ok(())
}

pub fn cmd_export(db: &Database, user_id: i64, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            tally_core::export::export_csv(db, user_id, file)?;
            println!("Exported transactions to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            tally_core::export::export_csv(db, user_id, &mut handle)?;
            handle.flush()?;
        }
    }

    Ok(())
}
