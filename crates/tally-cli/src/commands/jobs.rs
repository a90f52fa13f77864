//! Recurring rule and notification job command implementations

use anyhow::Result;
use chrono::Utc;
use tally_core::db::Database;
use tally_core::jobs;

pub fn cmd_apply_recurring(db: &Database) -> Result<()> {
    let today = Utc::now().date_naive();
    let created = jobs::apply_recurring(db, today)?;

    if created == 0 {
        println!("No recurring rules due.");
    } else {
        println!("Created {} transactions from recurring rules.", created);
    }

    Ok(())
}

pub fn cmd_run_jobs(db: &Database, which: &str) -> Result<()> {
    let today = Utc::now().date_naive();

    match which {
        "hourly" => {
            println!("Running hourly jobs...");
            jobs::run_hourly(db, today)?;
        }
        "daily" => {
            println!("Running daily jobs...");
            jobs::run_daily(db, today)?;
        }
        "all" => {
            println!("Running hourly and daily jobs...");
            jobs::run_hourly(db, today)?;
            jobs::run_daily(db, today)?;
        }
        other => anyhow::bail!("Unknown job batch '{}'. Use hourly, daily, or all", other),
    }

    println!("Done. Run 'tally status' to see what was created.");
    Ok(())
}
