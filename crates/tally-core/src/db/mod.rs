//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - `CategoryStore` over SQLite
//! - `expenses` - `ExpenseStore` over SQLite
//!
//! Both stores are implemented for [`rusqlite::Connection`], so the same code
//! runs on a bare pooled connection or inside an open transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, StorageError};

mod categories;
mod expenses;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
///
/// Cheap to clone; clones share the pool and the per-user write locks.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// One mutation lock per user, created on demand and dropped once no
    /// write holds it
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Database {
    /// Open (or create) a database using the given configuration
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.db_path.to_string_lossy().to_string();
        Self::with_settings(&path, config.pool_size, config.busy_timeout)
    }

    /// Open (or create) a database at `path` with default pool settings
    pub fn new(path: &str) -> Result<Self> {
        let config = Config::default();
        Self::with_settings(path, config.pool_size, config.busy_timeout)
    }

    fn with_settings(path: &str, pool_size: u32, busy_timeout: Duration) -> Result<Self> {
        // Applied on every new pooled connection
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any leftovers from an earlier run, including WAL sidecars
        for suffix in ["", "-wal", "-shm"] {
            let mut stale = path.clone().into_os_string();
            stale.push(suffix);
            let _ = std::fs::remove_file(stale);
        }

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run `f` as one atomic write on behalf of `user_id`
    ///
    /// Writes for the same user are serialized by a per-user lock; the
    /// transaction takes SQLite's write lock up front (`BEGIN IMMEDIATE`).
    /// Returning `Err` from `f` rolls everything back.
    pub fn write<T, F>(&self, user_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let user_lock = self.user_lock(user_id)?;
        let result = (|| -> Result<T> {
            let _guard = user_lock
                .lock()
                .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

            let mut conn = self.conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            // Dropping `tx` without commit rolls back
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })();

        drop(user_lock);
        self.release_user_lock(user_id);
        result
    }

    /// Run `f` inside a read transaction so every query sees one snapshot
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn user_lock(&self, user_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let lock = locks
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Created mutation lock");
                Arc::new(Mutex::new(()))
            })
            .clone();
        Ok(lock)
    }

    /// Forget the lock for `user_id` once nobody else holds a handle to it
    ///
    /// Handles are only cloned under the map lock, so a count of one here
    /// means no writer is waiting on it.
    fn release_user_lock(&self, user_id: &str) {
        let Ok(mut locks) = self.user_locks.lock() else {
            return;
        };
        let unused = locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(user_id);
            debug!(user_id, "Released mutation lock");
        }
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers, and each read
            -- transaction sees a consistent snapshot
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Categories (per-user materialized-path tree)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                name_normalized TEXT NOT NULL,             -- trimmed + lower-cased, sibling uniqueness
                parent_id INTEGER REFERENCES categories(id),
                path TEXT NOT NULL,                        -- derived from the parent chain
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, path)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user_path ON categories(user_id, path);
            CREATE INDEX IF NOT EXISTS idx_categories_user_parent ON categories(user_id, parent_id, name_normalized);

            -- Expenses (immutable once written)
            -- category_id has no foreign key: deleting a category can leave
            -- orphaned references which reports skip
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount TEXT NOT NULL,                      -- exact decimal string
                kind TEXT NOT NULL,                        -- DEBIT, CREDIT
                description TEXT NOT NULL,
                occurred_at INTEGER NOT NULL,              -- unix microseconds, UTC
                category_id INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_user_time ON expenses(user_id, occurred_at);
            CREATE INDEX IF NOT EXISTS idx_expenses_user_category ON expenses(user_id, category_id);
            "#,
        )?;

        info!(path = %self.db_path, "Database schema initialized");
        Ok(())
    }
}
