//! Tally CLI - Category tree and expense reports
//!
//! Usage:
//!   tally init                                  Initialize database
//!   tally categories add Despesas/Lazer         Add a category under an existing parent
//!   tally expenses add 42.50 "Cinema" --category Despesas/Lazer
//!   tally report --period last-month            Debit/credit totals per category

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.db.as_deref(), cli.config.as_deref())?;
    let user = cli.user.as_str();
    let json = cli.json;

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Categories { action } => {
            let db = commands::open_db(&config)?;
            match action {
                None | Some(CategoriesAction::List) => {
                    commands::cmd_categories_list(&db, user, json)
                }
                Some(CategoriesAction::Add { path }) => {
                    commands::cmd_categories_add(&db, user, &path, json)
                }
                Some(CategoriesAction::Rename { category, new_name }) => {
                    commands::cmd_categories_rename(&db, user, &category, &new_name, json)
                }
                Some(CategoriesAction::Move { category, to }) => {
                    commands::cmd_categories_move(&db, user, &category, &to, json)
                }
                Some(CategoriesAction::Delete { category }) => {
                    commands::cmd_categories_delete(&db, user, &category)
                }
                Some(CategoriesAction::Path { id }) => {
                    commands::cmd_categories_path(&db, user, id)
                }
                Some(CategoriesAction::Check) => commands::cmd_categories_check(&db, user, json),
            }
        }
        Commands::Expenses { action } => {
            let db = commands::open_db(&config)?;
            match action {
                ExpensesAction::Add {
                    amount,
                    description,
                    kind,
                    category,
                    date,
                } => commands::cmd_expenses_add(
                    &db,
                    user,
                    &commands::ExpenseInput {
                        amount: &amount,
                        description: &description,
                        kind: &kind,
                        category: category.as_deref(),
                        date: date.as_deref(),
                    },
                    json,
                ),
                ExpensesAction::List { period, from, to } => {
                    let range = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
                    commands::cmd_expenses_list(&db, user, range, json)
                }
            }
        }
        Commands::Report {
            period,
            from,
            to,
            category,
        } => {
            let db = commands::open_db(&config)?;
            let range = commands::resolve_period(&period, from.as_deref(), to.as_deref())?;
            commands::cmd_report(&db, user, range, category.as_deref(), json)
        }
    }
}
