//! Recording and looking up expenses

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Expense, NewExpense};
use crate::store::{CategoryStore, ExpenseStore};

#[derive(Clone)]
pub struct ExpenseService {
    db: Database,
}

impl ExpenseService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate and store a new expense
    ///
    /// The amount must be strictly positive (direction lives in `kind`) and
    /// the description non-blank. A category, when given, must belong to
    /// the same user.
    pub fn create(&self, user_id: &str, expense: &NewExpense) -> Result<Expense> {
        if expense.amount <= Decimal::ZERO {
            return Err(Error::InvalidData(format!(
                "amount must be positive, got {}",
                expense.amount
            )));
        }
        if expense.description.trim().is_empty() {
            return Err(Error::InvalidData(
                "description must not be blank".to_string(),
            ));
        }

        // Held under the user's write lock so the category cannot be deleted
        // between the check and the insert
        let created = self.db.write(user_id, |store| {
            if let Some(category_id) = expense.category_id {
                if store.find_category_by_id(user_id, category_id)?.is_none() {
                    return Err(Error::NotFound(format!("category {}", category_id)));
                }
            }
            let id = store.insert_expense(user_id, expense)?;
            store
                .find_expense_by_id(user_id, id)?
                .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
        })?;

        info!(
            user_id,
            id = created.id,
            kind = %created.kind,
            amount = %created.amount,
            category_id = ?created.category_id,
            "Recorded expense"
        );
        Ok(created)
    }

    pub fn get(&self, user_id: &str, id: i64) -> Result<Expense> {
        let conn = self.db.conn()?;
        conn.find_expense_by_id(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
    }

    /// Expenses with `start <= timestamp < end`, oldest first
    pub fn list_in_period(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        if start >= end {
            return Err(Error::InvalidRange { start, end });
        }
        let conn = self.db.conn()?;
        conn.find_expenses_by_time_range(user_id, start, end)
    }

    pub fn exists_for_category(&self, user_id: &str, category_id: i64) -> Result<bool> {
        let conn = self.db.conn()?;
        conn.exists_expense_for_category(user_id, category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryTree;
    use crate::models::ExpenseKind;
    use chrono::TimeZone;

    const USER: &str = "ana@example.com";

    fn setup() -> (CategoryTree, ExpenseService) {
        let db = Database::in_memory().unwrap();
        (CategoryTree::new(db.clone()), ExpenseService::new(db))
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    fn expense(amount: &str, description: &str, day: u32, category_id: Option<i64>) -> NewExpense {
        NewExpense {
            amount: amount.parse().unwrap(),
            kind: ExpenseKind::Debit,
            description: description.to_string(),
            timestamp: at(day),
            category_id,
        }
    }

    #[test]
    fn test_create_and_get() {
        let (tree, service) = setup();
        let lazer = tree.create_root(USER, "Lazer").unwrap();

        let created = service
            .create(USER, &expense("150.75", "Cinema", 10, Some(lazer.id)))
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.amount, Decimal::new(15075, 2));
        assert_eq!(created.timestamp, at(10));

        let found = service.get(USER, created.id).unwrap();
        assert_eq!(found, created);
        assert_eq!(found.description, "Cinema");
    }

    #[test]
    fn test_amount_precision_is_preserved() {
        let (_tree, service) = setup();
        let created = service
            .create(USER, &expense("0.10", "Bala", 1, None))
            .unwrap();
        assert_eq!(created.amount.to_string(), "0.10");
    }

    #[test]
    fn test_create_rejects_non_positive_amount() {
        let (_tree, service) = setup();
        let err = service
            .create(USER, &expense("0", "Nada", 1, None))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        let err = service
            .create(USER, &expense("-5", "Estorno", 1, None))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_create_rejects_blank_description() {
        let (_tree, service) = setup();
        let err = service
            .create(USER, &expense("20", "    ", 1, None))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_create_rejects_unknown_category() {
        let (tree, service) = setup();
        let theirs = tree.create_root("bruno@example.com", "Lazer").unwrap();

        let err = service
            .create(USER, &expense("40", "Lanche", 1, Some(theirs.id)))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = service
            .create(USER, &expense("40", "Lanche", 1, Some(9999)))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_get_other_users_expense() {
        let (_tree, service) = setup();
        let created = service
            .create(USER, &expense("10", "Café", 1, None))
            .unwrap();

        let err = service.get("bruno@example.com", created.id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_list_in_period_is_half_open() {
        let (_tree, service) = setup();
        service.create(USER, &expense("1", "antes", 1, None)).unwrap();
        service.create(USER, &expense("2", "inicio", 5, None)).unwrap();
        service.create(USER, &expense("3", "meio", 7, None)).unwrap();
        service.create(USER, &expense("4", "fim", 10, None)).unwrap();
        service
            .create("bruno@example.com", &expense("5", "outro", 7, None))
            .unwrap();

        let found = service.list_in_period(USER, at(5), at(10)).unwrap();
        let descriptions: Vec<&str> = found.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["inicio", "meio"]);
    }

    #[test]
    fn test_list_in_period_invalid_range() {
        let (_tree, service) = setup();
        let err = service.list_in_period(USER, at(10), at(10)).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_exists_for_category() {
        let (tree, service) = setup();
        let lazer = tree.create_root(USER, "Lazer").unwrap();
        assert!(!service.exists_for_category(USER, lazer.id).unwrap());

        service
            .create(USER, &expense("12", "Teatro", 3, Some(lazer.id)))
            .unwrap();
        assert!(service.exists_for_category(USER, lazer.id).unwrap());
        assert!(!service
            .exists_for_category("bruno@example.com", lazer.id)
            .unwrap());
    }
}
