//! Storage traits
//!
//! The category tree and report engine talk to storage only through these
//! traits. Every method is scoped to a single user. Multi-step operations
//! run them against one open transaction (see [`crate::db::Database::write`]
//! and [`crate::db::Database::read`]).

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Category, Expense, NewCategory, NewExpense};

/// Persistence for the category hierarchy
pub trait CategoryStore {
    /// Insert a category with an already-computed path, returning its ID
    fn insert_category(&self, category: &NewCategory, path: &str) -> Result<i64>;

    fn find_category_by_id(&self, user_id: &str, id: i64) -> Result<Option<Category>>;

    fn find_category_by_path(&self, user_id: &str, path: &str) -> Result<Option<Category>>;

    /// Strict descendants of `path`, ordered by path
    fn find_categories_by_path_prefix(&self, user_id: &str, path: &str) -> Result<Vec<Category>>;

    /// True if a sibling under `parent_id` already uses `name_normalized`.
    /// `exclude_id` lets a node ignore its own row.
    fn exists_category_name(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
        name_normalized: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    fn exists_category_path(&self, user_id: &str, path: &str) -> Result<bool>;

    fn has_children(&self, user_id: &str, id: i64) -> Result<bool>;

    /// Overwrite name, parent, and path of a single row
    fn update_category(
        &self,
        user_id: &str,
        id: i64,
        name: &str,
        parent_id: Option<i64>,
        path: &str,
    ) -> Result<()>;

    fn update_category_path(&self, user_id: &str, id: i64, path: &str) -> Result<()>;

    /// Returns false if nothing was deleted
    fn delete_category(&self, user_id: &str, id: i64) -> Result<bool>;

    /// All of a user's categories ordered by path
    fn find_all_categories_ordered(&self, user_id: &str) -> Result<Vec<Category>>;
}

/// Persistence for expenses
pub trait ExpenseStore {
    fn insert_expense(&self, user_id: &str, expense: &NewExpense) -> Result<i64>;

    fn find_expense_by_id(&self, user_id: &str, id: i64) -> Result<Option<Expense>>;

    /// Expenses with `start <= timestamp < end`, oldest first
    fn find_expenses_by_time_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>>;

    fn exists_expense_for_category(&self, user_id: &str, category_id: i64) -> Result<bool>;
}
