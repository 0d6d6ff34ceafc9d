//! Report command implementations

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tally_core::{CategoryTree, Database, ReportEngine};

use super::categories::resolve_category_arg;
use super::truncate;

/// A span of whole days, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Period {
    /// Midnight UTC at the start of `from`
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC after `to`, so the last day is fully covered
    pub fn end(&self) -> Result<DateTime<Utc>> {
        let next = self
            .to
            .succ_opt()
            .with_context(|| format!("Date out of range: {}", self.to))?;
        Ok(next.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("Invalid month: {}-{:02}", year, month))
}

/// Resolve a period string to an inclusive date span
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<Period> {
    // If custom dates provided, use those
    match (custom_from, custom_to) {
        (Some(from), Some(to)) => {
            let from = NaiveDate::parse_from_str(from, "%Y-%m-%d")
                .context("Invalid --from date format (use YYYY-MM-DD)")?;
            let to = NaiveDate::parse_from_str(to, "%Y-%m-%d")
                .context("Invalid --to date format (use YYYY-MM-DD)")?;
            return Ok(Period { from, to });
        }
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("--from and --to must be given together")
        }
        (None, None) => {}
    }

    let today = Utc::now().date_naive();

    let (from, to) = match period.to_lowercase().as_str() {
        "this-month" => (first_of_month(today.year(), today.month())?, today),
        "last-month" => {
            let this_month = first_of_month(today.year(), today.month())?;
            let last_day = this_month
                .pred_opt()
                .context("Date out of range before this month")?;
            (first_of_month(last_day.year(), last_day.month())?, last_day)
        }
        "this-year" => (first_of_month(today.year(), 1)?, today),
        "last-30-days" => (today - Duration::days(30), today),
        "last-90-days" => (today - Duration::days(90), today),
        // Every representable day; `end()` needs one day of headroom
        "all" => (
            NaiveDate::MIN,
            NaiveDate::MAX
                .pred_opt()
                .context("Date out of range at the end of time")?,
        ),
        _ => anyhow::bail!(
            "Unknown period: {}. Available: this-month, last-month, this-year, last-30-days, last-90-days, all",
            period
        ),
    };

    Ok(Period { from, to })
}

pub fn cmd_report(
    db: &Database,
    user: &str,
    period: Period,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let engine = ReportEngine::new(db.clone());
    let start = period.start();
    let end = period.end()?;

    let report = match category {
        Some(arg) => {
            let tree = CategoryTree::new(db.clone());
            let root = resolve_category_arg(&tree, user, arg)?;
            engine.generate_for_category_tree(user, start, end, root.id)?
        }
        None => engine.generate(user, start, end)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("📊 Expense Report");
    println!("   Period: {} to {}", period.from, period.to);
    if let Some(arg) = category {
        println!("   Category: {}", arg);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if report.items.is_empty() {
        println!("   No expenses found in this period.");
        return Ok(());
    }

    println!(
        "   {:30} │ {:>12} │ {:>12} │ {:>12}",
        "Category", "Debit", "Credit", "Balance"
    );
    println!("   ───────────────────────────────┼──────────────┼──────────────┼─────────────");

    for item in &report.items {
        println!(
            "   {:30} │ {:>12} │ {:>12} │ {:>12}",
            truncate(&item.category_path, 30),
            item.debit_sum.round_dp(2),
            item.credit_sum.round_dp(2),
            item.balance().round_dp(2)
        );
    }

    println!("   ───────────────────────────────┼──────────────┼──────────────┼─────────────");
    println!(
        "   {:30} │ {:>12} │ {:>12} │ {:>12}",
        "Total",
        report.total_debit.round_dp(2),
        report.total_credit.round_dp(2),
        report.balance.round_dp(2)
    );

    Ok(())
}
