//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod bills;
pub mod budgets;
pub mod export;
pub mod goals;
pub mod notifications;
pub mod recurring;
pub mod reports;
pub mod transactions;

// Re-export all handlers for use in router
pub use accounts::*;
pub use bills::*;
pub use budgets::*;
pub use export::*;
pub use goals::*;
pub use notifications::*;
pub use recurring::*;
pub use reports::*;
pub use transactions::*;
