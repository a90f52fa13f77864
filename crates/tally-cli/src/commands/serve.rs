//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    println!("Starting Tally web server...");
    println!("   Database:  {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;
    tally_server::serve(db, host, port).await?;

    Ok(())
}
