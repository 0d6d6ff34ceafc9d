//! Domain models for Tally

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ========== Category Models ==========

/// A node in a user's category hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    /// Display name, original casing and whitespace preserved
    pub name: String,
    /// Parent category ID (None = root category)
    pub parent_id: Option<i64>,
    /// Materialized path (e.g., "Despesas/Lazer/Cinema"), derived from the
    /// parent chain and only ever written by the category tree
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A category that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub user_id: String,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl NewCategory {
    pub fn root(user_id: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            parent_id: None,
        }
    }

    pub fn child(user_id: &str, name: &str, parent_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            parent_id: Some(parent_id),
        }
    }
}

/// A category with its children (for tree display)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    /// Depth in hierarchy (0 = root)
    pub depth: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

/// Outcome of a rename or move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRewrite {
    pub category_id: i64,
    pub old_path: String,
    pub new_path: String,
    /// The node itself plus every strict descendant (0 when nothing changed)
    pub rows_updated: usize,
}

/// A stored path that no longer matches its parent chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMismatch {
    pub category_id: i64,
    pub stored: String,
    pub expected: String,
}

// ========== Expense Models ==========

/// Whether an expense takes money out or brings it in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseKind {
    Debit,
    Credit,
}

impl ExpenseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl std::str::FromStr for ExpenseKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBIT" => Ok(Self::Debit),
            "CREDIT" => Ok(Self::Credit),
            _ => Err(format!("Unknown expense kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded transaction. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: String,
    /// Always positive; direction is carried by `kind`
    pub amount: Decimal,
    pub kind: ExpenseKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// None = uncategorized
    pub category_id: Option<i64>,
}

/// For inserting new expenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub kind: ExpenseKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub category_id: Option<i64>,
}

// ========== Report Models ==========

/// Label of the synthetic bucket holding expenses without a category
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Per-category sums within a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub category_path: String,
    pub debit_sum: Decimal,
    pub credit_sum: Decimal,
}

impl ReportItem {
    pub fn balance(&self) -> Decimal {
        self.credit_sum - self.debit_sum
    }
}

/// Aggregated totals for a time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// `total_credit - total_debit`
    pub balance: Decimal,
    /// Sorted by category path, ancestors before descendants
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn empty() -> Self {
        Self {
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            balance: Decimal::ZERO,
            items: Vec::new(),
        }
    }

    pub fn item(&self, category_path: &str) -> Option<&ReportItem> {
        self.items.iter().find(|i| i.category_path == category_path)
    }
}
