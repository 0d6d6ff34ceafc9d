//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tool:
//! - Database access, migrations and transaction boundaries
//! - Per-user category hierarchy stored as materialized paths
//! - Expense recording with exact decimal amounts
//! - Debit/credit reports grouped by category path
//! - Configuration loading

pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod expenses;
pub mod models;
pub mod path;
pub mod reports;
pub mod store;

pub use categories::CategoryTree;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result, StorageError};
pub use expenses::ExpenseService;
pub use models::{
    Category, CategoryNode, Expense, ExpenseKind, NewCategory, NewExpense, PathMismatch,
    PathRewrite, Report, ReportItem, UNCATEGORIZED_LABEL,
};
pub use reports::ReportEngine;
pub use store::{CategoryStore, ExpenseStore};
