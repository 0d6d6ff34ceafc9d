//! Debit/credit reports over a time window
//!
//! Categories and expenses are read in one snapshot, then every expense is
//! attributed to its category's current path. Expenses without a category
//! land in the synthetic [`UNCATEGORIZED_LABEL`] bucket. Expenses whose
//! category has since been deleted are orphaned: they are left out of both
//! the items and the grand totals, and only a warning is logged.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseKind, Report, ReportItem, UNCATEGORIZED_LABEL};
use crate::path;
use crate::store::{CategoryStore, ExpenseStore};

#[derive(Clone)]
pub struct ReportEngine {
    db: Database,
}

/// Sort key for report items: the label, then whether the bucket is the
/// synthetic one (so a real category with the same label comes first)
type ItemKey = (String, bool);

#[derive(Default)]
struct Sums {
    debit: Decimal,
    credit: Decimal,
}

impl ReportEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Totals for every expense of `user_id` in `[start, end)`
    pub fn generate(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Report> {
        self.generate_scoped(user_id, start, end, None)
    }

    /// Totals restricted to `root_category_id` and its descendants
    pub fn generate_for_category_tree(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        root_category_id: i64,
    ) -> Result<Report> {
        self.generate_scoped(user_id, start, end, Some(root_category_id))
    }

    fn generate_scoped(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        root_category_id: Option<i64>,
    ) -> Result<Report> {
        if start >= end {
            return Err(Error::InvalidRange { start, end });
        }

        let (categories, expenses) = self.db.read(|store| {
            let categories = store.find_all_categories_ordered(user_id)?;
            let expenses = store.find_expenses_by_time_range(user_id, start, end)?;
            Ok((categories, expenses))
        })?;

        let paths: HashMap<i64, String> = categories.into_iter().map(|c| (c.id, c.path)).collect();

        let scope = match root_category_id {
            Some(id) => Some(
                paths
                    .get(&id)
                    .map(String::as_str)
                    .ok_or(Error::InvalidCategory(id))?,
            ),
            None => None,
        };

        let (report, orphaned) = aggregate(&paths, scope, &expenses)?;

        if orphaned > 0 {
            warn!(
                user_id,
                orphaned, "Expenses reference deleted categories and were left out of the report"
            );
        }
        debug!(
            user_id,
            %start,
            %end,
            scope = ?scope,
            expenses = expenses.len(),
            items = report.items.len(),
            "Generated report"
        );

        Ok(report)
    }
}

/// Sum expenses per category path
///
/// With a `scope`, only expenses whose path is the scope or lies below it
/// are counted (uncategorized expenses are outside every scope). Returns the
/// report and the number of orphaned expenses skipped, or `InvalidData` when
/// a sum does not fit in a `Decimal`.
fn aggregate(
    paths: &HashMap<i64, String>,
    scope: Option<&str>,
    expenses: &[Expense],
) -> Result<(Report, usize)> {
    let mut buckets: BTreeMap<ItemKey, Sums> = BTreeMap::new();
    let mut orphaned = 0;

    for expense in expenses {
        let key = match expense.category_id {
            Some(category_id) => match paths.get(&category_id) {
                Some(category_path) => (category_path.clone(), false),
                None => {
                    orphaned += 1;
                    continue;
                }
            },
            None => (UNCATEGORIZED_LABEL.to_string(), true),
        };

        if let Some(root) = scope {
            let (label, synthetic) = &key;
            if *synthetic || !path::is_within(label, root) {
                continue;
            }
        }

        let sums = buckets.entry(key).or_default();
        let slot = match expense.kind {
            ExpenseKind::Debit => &mut sums.debit,
            ExpenseKind::Credit => &mut sums.credit,
        };
        *slot = checked_sum(*slot, expense.amount)?;
    }

    let items: Vec<ReportItem> = buckets
        .into_iter()
        .map(|((category_path, _), sums)| ReportItem {
            category_path,
            debit_sum: sums.debit,
            credit_sum: sums.credit,
        })
        .collect();

    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    for item in &items {
        total_debit = checked_sum(total_debit, item.debit_sum)?;
        total_credit = checked_sum(total_credit, item.credit_sum)?;
    }
    // Both totals are non-negative, so the difference always fits
    let balance = total_credit - total_debit;

    let report = Report {
        total_debit,
        total_credit,
        balance,
        items,
    };
    Ok((report, orphaned))
}

fn checked_sum(acc: Decimal, amount: Decimal) -> Result<Decimal> {
    acc.checked_add(amount).ok_or_else(|| {
        Error::InvalidData(format!(
            "report total overflows adding {} to {}",
            amount, acc
        ))
    })
}
