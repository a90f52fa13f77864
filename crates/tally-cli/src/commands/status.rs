//! Status command implementation

use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use super::open_db;

pub fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("Tally Status");
    println!("   ----------------------------------------");
    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'tally init' to get started.");
        return Ok(());
    }

    if let Ok(metadata) = fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    let db = open_db(db_path)?;
    let today = Utc::now().date_naive();

    for user in db.list_users()? {
        let stats = db.dashboard_stats(user.id, today)?;

        println!();
        println!("   User: {} (id {})", user.username, user.id);
        println!("      Accounts:       {}", stats.account_count);
        println!("      Total balance:  ${:.2}", stats.total_balance);
        println!(
            "      This month:     ${:.2} in / ${:.2} out",
            stats.month_income, stats.month_expenses
        );
        if stats.pending_bills > 0 {
            println!("      Pending bills:  {}", stats.pending_bills);
        }
        if stats.active_goals > 0 {
            println!("      Active goals:   {}", stats.active_goals);
        }
        if stats.unread_notifications > 0 {
            println!(
                "      Unread notifications: {}",
                stats.unread_notifications
            );
        }
    }

    println!();
    Ok(())
}
