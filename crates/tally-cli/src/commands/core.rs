//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration, applying the `--db` flag last
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{Config, Database};
use tracing::debug;

/// Load config file + environment, then let `--db` override the path
pub fn load_config(db_path: Option<&Path>, config_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(path) = db_path {
        config.db_path = path.to_path_buf();
    }
    debug!(
        db_path = %config.db_path.display(),
        pool_size = config.pool_size,
        "Resolved configuration"
    );
    Ok(config)
}

pub fn open_db(config: &Config) -> Result<Database> {
    Database::open(config)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))
}

pub fn cmd_init(config: &Config) -> Result<()> {
    println!(
        "🔧 Initializing database at {}...",
        config.db_path.display()
    );

    let _db = open_db(config)?;
    println!("   Pool size: {}", config.pool_size);
    println!("   Busy timeout: {}ms", config.busy_timeout.as_millis());

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add categories: tally categories add Despesas");
    println!("  2. Record expenses: tally expenses add 42.50 \"Cinema\" --category Despesas/Lazer");
    println!("  3. See totals: tally report --period this-month");

    Ok(())
}
