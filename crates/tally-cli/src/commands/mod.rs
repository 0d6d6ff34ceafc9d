//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `categories` - Category tree commands (list, add, rename, move, delete, path, check)
//! - `core` - Init plus shared utilities (load_config, open_db)
//! - `expenses` - Expense commands (add, list)
//! - `reports` - Report generation and period parsing

pub mod categories;
pub mod core;
pub mod expenses;
pub mod reports;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use expenses::*;
pub use reports::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
