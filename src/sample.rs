//! Demo data set loaded by the `seed` command.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Budget, MonthPeriod, Transaction, TransactionKind};

const SAMPLE_TRANSACTIONS: &[(&str, &str, &str, &str, TransactionKind)] = &[
    ("1200.00", "2024-01-15", "Salary", "Other", TransactionKind::Income),
    ("45.50", "2024-01-14", "Grocery shopping", "Groceries", TransactionKind::Expense),
    ("15.75", "2024-01-13", "Coffee and lunch", "Food & Dining", TransactionKind::Expense),
    ("89.99", "2024-01-12", "Monthly internet bill", "Bills & Utilities", TransactionKind::Expense),
    ("25.00", "2024-01-11", "Gas station", "Transportation", TransactionKind::Expense),
    ("120.00", "2024-01-10", "Shopping clothes", "Shopping", TransactionKind::Expense),
    ("35.00", "2024-01-09", "Movie tickets", "Entertainment", TransactionKind::Expense),
    ("500.00", "2023-12-30", "Freelance project", "Other", TransactionKind::Income),
    ("75.50", "2023-12-28", "Weekly groceries", "Groceries", TransactionKind::Expense),
    ("200.00", "2023-12-25", "Holiday gifts", "Shopping", TransactionKind::Expense),
];

const SAMPLE_BUDGETS: &[(&str, i64)] = &[
    ("Food & Dining", 800),
    ("Transportation", 400),
    ("Shopping", 300),
    ("Entertainment", 200),
    ("Bills & Utilities", 600),
    ("Groceries", 500),
];

pub(crate) fn transactions() -> Result<Vec<Transaction>> {
    SAMPLE_TRANSACTIONS
        .iter()
        .map(|&(amount, date, description, category, kind)| {
            let amount: Decimal = amount
                .parse()
                .with_context(|| format!("Bad sample amount: {amount}"))?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Bad sample date: {date}"))?;
            Ok(Transaction::new(
                amount,
                date,
                description.to_string(),
                Some(category.to_string()),
                kind,
            ))
        })
        .collect()
}

/// Sample budgets for the month containing `today`.
pub(crate) fn budgets(today: NaiveDate) -> Vec<Budget> {
    let period = MonthPeriod::containing(today);
    SAMPLE_BUDGETS
        .iter()
        .map(|&(category, amount)| {
            Budget::new(
                category.to_string(),
                Decimal::from(amount),
                period.month_str(),
                period.year(),
            )
        })
        .collect()
}
