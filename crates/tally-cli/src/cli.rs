//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize expenses and report on them
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal finance category tree and expense reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides config file and TALLY_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to <data dir>/tally/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// User whose categories and expenses are managed
    #[arg(short, long, global = true, env = "TALLY_USER", default_value = "default")]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage categories (list, add, rename, move, delete)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Record and list expenses
    Expenses {
        #[command(subcommand)]
        action: ExpensesAction,
    },

    /// Debit/credit totals per category for a period
    Report {
        /// Time period: this-month, last-month, this-year, last-30-days, last-90-days, all
        #[arg(long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date, inclusive (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,

        /// Restrict to a category subtree (ID or path, e.g. "Despesas/Lazer")
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// Show the category tree
    List,

    /// Add a category by path; the parent must already exist
    Add {
        /// Category path (e.g., "Despesas/Lazer" or just "Receitas" for a root)
        path: String,
    },

    /// Rename a category (descendant paths follow)
    Rename {
        /// Category ID or path
        category: String,
        /// New name (just the name, not full path)
        new_name: String,
    },

    /// Move a category to a new parent
    Move {
        /// Category ID or path
        category: String,
        /// New parent ID or path (use "root" for no parent)
        #[arg(long)]
        to: String,
    },

    /// Delete a category with no children and no expenses
    Delete {
        /// Category ID or path
        category: String,
    },

    /// Print the full path of a category
    Path {
        /// Category ID
        id: i64,
    },

    /// Verify every stored path matches its parent chain
    Check,
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// Record an expense
    Add {
        /// Amount, always positive (e.g., 42.50)
        amount: String,

        /// What the expense was for
        description: String,

        /// Direction: debit or credit
        #[arg(long, default_value = "debit")]
        kind: String,

        /// Category ID or path (uncategorized if omitted)
        #[arg(long)]
        category: Option<String>,

        /// Date (YYYY-MM-DD) or RFC 3339 timestamp; defaults to now
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses in a period
    List {
        /// Time period: this-month, last-month, this-year, last-30-days, last-90-days, all
        #[arg(long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date, inclusive (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,
    },
}
