//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `csv` - CSV import/export commands
//! - `jobs` - Recurring rules and notification job commands
//! - `sample` - Sample data generation
//! - `serve` - Web server command
//! - `status` - Status command

pub mod core;
pub mod csv;
pub mod jobs;
pub mod sample;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use core::*;
pub use csv::*;
pub use jobs::*;
pub use sample::*;
pub use serve::*;
pub use status::*;
