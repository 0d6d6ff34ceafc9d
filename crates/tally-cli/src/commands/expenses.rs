//! Expense command implementations

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_core::models::{ExpenseKind, NewExpense, UNCATEGORIZED_LABEL};
use tally_core::{CategoryTree, Database, ExpenseService};

use super::categories::resolve_category_arg;
use super::reports::Period;
use super::truncate;

/// Raw `expenses add` arguments as typed on the command line
pub struct ExpenseInput<'a> {
    pub amount: &'a str,
    pub description: &'a str,
    pub kind: &'a str,
    pub category: Option<&'a str>,
    pub date: Option<&'a str>,
}

/// Accept either an RFC 3339 timestamp or a bare date (midnight UTC)
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD or RFC 3339)", s))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

pub fn cmd_expenses_add(db: &Database, user: &str, input: &ExpenseInput<'_>, json: bool) -> Result<()> {
    let amount = Decimal::from_str(input.amount)
        .with_context(|| format!("Invalid amount: {}", input.amount))?;
    let kind: ExpenseKind = input.kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let timestamp = match input.date {
        Some(s) => parse_timestamp(s)?,
        None => Utc::now(),
    };

    let category = match input.category {
        Some(arg) => {
            let tree = CategoryTree::new(db.clone());
            Some(resolve_category_arg(&tree, user, arg)?)
        }
        None => None,
    };

    let service = ExpenseService::new(db.clone());
    let expense = service.create(
        user,
        &NewExpense {
            amount,
            kind,
            description: input.description.to_string(),
            timestamp,
            category_id: category.as_ref().map(|c| c.id),
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expense)?);
    } else {
        let label = category
            .as_ref()
            .map(|c| c.path.as_str())
            .unwrap_or(UNCATEGORIZED_LABEL);
        println!(
            "✅ Recorded {} {} '{}' in {} (id: {})",
            expense.kind, expense.amount, expense.description, label, expense.id
        );
    }

    Ok(())
}

pub fn cmd_expenses_list(db: &Database, user: &str, period: Period, json: bool) -> Result<()> {
    let service = ExpenseService::new(db.clone());
    let expenses = service.list_in_period(user, period.start(), period.end()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
        return Ok(());
    }

    println!();
    println!("💳 Expenses");
    println!("   Period: {} to {}", period.from, period.to);
    println!("   ─────────────────────────────────────────────────────────────");

    if expenses.is_empty() {
        println!("   No expenses found in this period.");
        return Ok(());
    }

    let tree = CategoryTree::new(db.clone());
    let paths: HashMap<i64, String> = tree
        .list_ordered(user)?
        .into_iter()
        .map(|c| (c.id, c.path))
        .collect();

    println!(
        "   {:>5} │ {:10} │ {:6} │ {:>10} │ {:20} │ {}",
        "ID", "Date", "Kind", "Amount", "Category", "Description"
    );
    println!("   ──────┼────────────┼────────┼────────────┼──────────────────────┼─────────────");

    for expense in &expenses {
        let category = match expense.category_id {
            Some(id) => paths
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("<deleted {}>", id)),
            None => UNCATEGORIZED_LABEL.to_string(),
        };
        println!(
            "   {:>5} │ {:10} │ {:6} │ {:>10} │ {:20} │ {}",
            expense.id,
            expense.timestamp.format("%Y-%m-%d"),
            expense.kind.as_str(),
            expense.amount.round_dp(2),
            truncate(&category, 20),
            truncate(&expense.description, 40)
        );
    }

    Ok(())
}
