//! Expense store operations

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Expense, ExpenseKind, NewExpense};
use crate::store::ExpenseStore;

const EXPENSE_COLUMNS: &str = "id, user_id, amount, kind, description, occurred_at, category_id";

/// Timestamps are stored as unix microseconds so range comparisons are exact
fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn conversion_error(idx: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, msg.into())
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let amount_str: String = row.get(2)?;
    let amount = Decimal::from_str(&amount_str)
        .map_err(|e| conversion_error(2, Type::Text, format!("bad amount '{}': {}", amount_str, e)))?;

    let kind_str: String = row.get(3)?;
    let kind = kind_str
        .parse::<ExpenseKind>()
        .map_err(|e| conversion_error(3, Type::Text, e))?;

    let micros: i64 = row.get(5)?;
    let timestamp = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        conversion_error(5, Type::Integer, format!("timestamp out of range: {}", micros))
    })?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount,
        kind,
        description: row.get(4)?,
        timestamp,
        category_id: row.get(6)?,
    })
}

impl ExpenseStore for Connection {
    fn insert_expense(&self, user_id: &str, expense: &NewExpense) -> Result<i64> {
        self.execute(
            r#"
            INSERT INTO expenses (user_id, amount, kind, description, occurred_at, category_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                expense.amount.to_string(),
                expense.kind.as_str(),
                expense.description,
                to_micros(expense.timestamp),
                expense.category_id
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn find_expense_by_id(&self, user_id: &str, id: i64) -> Result<Option<Expense>> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE user_id = ? AND id = ?",
            EXPENSE_COLUMNS
        );
        let expense = self
            .query_row(&sql, params![user_id, id], expense_from_row)
            .optional()?;
        Ok(expense)
    }

    fn find_expenses_by_time_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        let sql = format!(
            r#"
            SELECT {} FROM expenses
            WHERE user_id = ? AND occurred_at >= ? AND occurred_at < ?
            ORDER BY occurred_at, id
            "#,
            EXPENSE_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let expenses = stmt
            .query_map(
                params![user_id, to_micros(start), to_micros(end)],
                expense_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    fn exists_expense_for_category(&self, user_id: &str, category_id: i64) -> Result<bool> {
        let exists = self
            .query_row(
                "SELECT 1 FROM expenses WHERE user_id = ? AND category_id = ? LIMIT 1",
                params![user_id, category_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }
}
