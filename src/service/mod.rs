//! Request/response operations. Each function validates raw input, reads or
//! writes through [`Database`], and runs the aggregation pipeline over the
//! fetched snapshot.

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics;
use crate::db::{BudgetFilter, Database, TransactionFilter};
use crate::error::{dependency, ServiceError, ServiceResult};
use crate::models::*;
use crate::sample;

/// Raw transaction fields, as a form or request body delivers them.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionInput {
    pub(crate) amount: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionQuery {
    pub(crate) kind: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) to: Option<String>,
    pub(crate) category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BudgetInput {
    pub(crate) category: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) month: Option<String>,
    pub(crate) year: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SavedBudget {
    #[serde(flatten)]
    pub(crate) budget: Budget,
    pub(crate) updated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SeedSummary {
    pub(crate) message: String,
    pub(crate) transactions: usize,
    pub(crate) budgets: usize,
}

/// Largest amount a transaction or budget may carry: 10^15.
const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Amounts are whole cents.
const AMOUNT_SCALE: u32 = 2;

// ── Validation ────────────────────────────────────────────────

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> ServiceResult<&'a str> {
    present(value).ok_or_else(|| ServiceError::validation(field, "is required"))
}

pub(crate) fn parse_amount(value: Option<&str>) -> ServiceResult<Decimal> {
    let raw = required("amount", value)?;
    let amount: Decimal = raw
        .parse()
        .map_err(|_| ServiceError::validation("amount", format!("'{raw}' is not a number")))?;
    if amount <= Decimal::ZERO {
        return Err(ServiceError::validation("amount", "must be greater than zero"));
    }
    if amount > MAX_AMOUNT {
        return Err(ServiceError::validation(
            "amount",
            format!("must not exceed {MAX_AMOUNT}"),
        ));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ServiceError::validation(
            "amount",
            format!("must have at most {AMOUNT_SCALE} decimal places"),
        ));
    }
    Ok(amount)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, truncated to the local day.
pub(crate) fn parse_date(field: &'static str, value: Option<&str>) -> ServiceResult<NaiveDate> {
    let raw = required(field, value)?;
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).date_naive())
        .map_err(|_| ServiceError::validation(field, format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Two-digit zero-padded month, "01" through "12".
pub(crate) fn parse_month(value: Option<&str>) -> ServiceResult<u32> {
    let raw = required("month", value)?;
    let month = if raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse::<u32>().ok()
    } else {
        None
    };
    month
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ServiceError::validation("month", format!("'{raw}' is not a month 01-12")))
}

pub(crate) fn parse_year(value: Option<&str>) -> ServiceResult<i32> {
    let raw = required("year", value)?;
    let year = if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse::<i32>().ok()
    } else {
        None
    };
    year.ok_or_else(|| ServiceError::validation("year", format!("'{raw}' is not a 4-digit year")))
}

fn parse_kind(value: Option<&str>) -> ServiceResult<TransactionKind> {
    let raw = required("type", value)?;
    TransactionKind::parse(raw).ok_or_else(|| {
        ServiceError::validation("type", format!("'{raw}' must be income or expense"))
    })
}

fn parse_period(month: Option<&str>, year: Option<&str>) -> ServiceResult<MonthPeriod> {
    let month = parse_month(month)?;
    let year = parse_year(year)?;
    MonthPeriod::new(year, month)
        .ok_or_else(|| ServiceError::validation("month", "is not a valid calendar month"))
}

fn transaction_from_input(input: &TransactionInput) -> ServiceResult<Transaction> {
    let amount = parse_amount(input.amount.as_deref())?;
    let date = parse_date("date", input.date.as_deref())?;
    let description = required("description", input.description.as_deref())?.to_string();
    let kind = parse_kind(input.kind.as_deref())?;
    Ok(Transaction::new(
        amount,
        date,
        description,
        input.category.clone(),
        kind,
    ))
}

// ── Budgets ───────────────────────────────────────────────────

/// Budget vs actual spending for one calendar month.
pub(crate) fn budget_vs_actual(
    db: &Database,
    month: Option<&str>,
    year: Option<&str>,
) -> ServiceResult<Vec<BudgetVsActual>> {
    let period = parse_period(month, year)?;
    let budgets = db
        .get_budgets(&BudgetFilter::for_period(period))
        .map_err(dependency("fetch budget vs actual data"))?;
    let expenses = db
        .get_transactions(&TransactionFilter::expenses_in(period))
        .map_err(dependency("fetch budget vs actual data"))?;

    let rows = analytics::budget_vs_actual(period, &budgets, &expenses);
    tracing::debug!(%period, rows = rows.len(), "computed budget vs actual");
    Ok(rows)
}

pub(crate) fn list_budgets(
    db: &Database,
    month: Option<&str>,
    year: Option<&str>,
) -> ServiceResult<Vec<Budget>> {
    let filter = BudgetFilter {
        month: match present(month) {
            Some(m) => Some(format!("{:02}", parse_month(Some(m))?)),
            None => None,
        },
        year: match present(year) {
            Some(y) => Some(parse_year(Some(y))?),
            None => None,
        },
        category: None,
    };
    db.get_budgets(&filter).map_err(dependency("fetch budgets"))
}

/// Create a budget, or update the amount of the existing one for the same
/// (category, month, year).
pub(crate) fn create_budget(db: &mut Database, input: &BudgetInput) -> ServiceResult<SavedBudget> {
    let category = required("category", input.category.as_deref())?.to_string();
    let amount = parse_amount(input.amount.as_deref())?;
    let period = parse_period(input.month.as_deref(), input.year.as_deref())?;

    let budget = Budget::new(category, amount, period.month_str(), period.year());
    let saved = db
        .upsert_budget(&budget)
        .map_err(dependency("create budget"))?;

    tracing::info!(
        category = %saved.budget.category,
        %period,
        created = saved.created,
        "saved budget"
    );
    Ok(SavedBudget {
        budget: saved.budget,
        updated: !saved.created,
    })
}

pub(crate) fn delete_budget(db: &Database, id: i64) -> ServiceResult<()> {
    let deleted = db.delete_budget(id).map_err(dependency("delete budget"))?;
    if !deleted {
        return Err(ServiceError::NotFound {
            entity: "Budget",
            id,
        });
    }
    tracing::info!(id, "deleted budget");
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

pub(crate) fn chart_data(db: &Database, today: NaiveDate) -> ServiceResult<ChartData> {
    let expenses = db
        .get_transactions(&TransactionFilter::expenses())
        .map_err(dependency("fetch chart data"))?;
    Ok(analytics::chart_data(today, &expenses))
}

pub(crate) fn insights(db: &Database, today: NaiveDate) -> ServiceResult<SpendingInsights> {
    let current = MonthPeriod::containing(today);
    let last = current.previous();
    let expenses = db
        .get_transactions(&TransactionFilter::expenses_between(
            last.first_day(),
            current.last_day(),
        ))
        .map_err(dependency("fetch insights"))?;
    let budgets = db
        .get_budgets(&BudgetFilter::for_period(current))
        .map_err(dependency("fetch insights"))?;

    Ok(analytics::spending_insights(today, &expenses, &budgets))
}

// ── Transactions ──────────────────────────────────────────────

pub(crate) fn list_transactions(
    db: &Database,
    query: &TransactionQuery,
) -> ServiceResult<Vec<Transaction>> {
    let filter = TransactionFilter {
        kind: match present(query.kind.as_deref()) {
            Some(k) => Some(parse_kind(Some(k))?),
            None => None,
        },
        from: match present(query.from.as_deref()) {
            Some(d) => Some(parse_date("from", Some(d))?),
            None => None,
        },
        to: match present(query.to.as_deref()) {
            Some(d) => Some(parse_date("to", Some(d))?),
            None => None,
        },
        category: present(query.category.as_deref()).map(str::to_string),
    };
    db.get_transactions(&filter)
        .map_err(dependency("fetch transactions"))
}

pub(crate) fn create_transaction(
    db: &Database,
    input: &TransactionInput,
) -> ServiceResult<Transaction> {
    let mut txn = transaction_from_input(input)?;
    let id = db
        .insert_transaction(&txn)
        .map_err(dependency("create transaction"))?;
    txn.id = Some(id);
    tracing::info!(id, kind = %txn.kind, "created transaction");
    Ok(txn)
}

/// Replace the fields of an existing transaction, keeping its id and
/// creation time.
pub(crate) fn update_transaction(
    db: &Database,
    id: i64,
    input: &TransactionInput,
) -> ServiceResult<Transaction> {
    let changes = transaction_from_input(input)?;
    let existing = db
        .get_transaction(id)
        .map_err(dependency("update transaction"))?
        .ok_or(ServiceError::NotFound {
            entity: "Transaction",
            id,
        })?;

    let updated = Transaction {
        id: Some(id),
        created_at: existing.created_at,
        ..changes
    };
    let found = db
        .update_transaction(id, &updated)
        .map_err(dependency("update transaction"))?;
    if !found {
        return Err(ServiceError::NotFound {
            entity: "Transaction",
            id,
        });
    }
    tracing::info!(id, "updated transaction");
    Ok(updated)
}

pub(crate) fn delete_transaction(db: &Database, id: i64) -> ServiceResult<()> {
    let deleted = db
        .delete_transaction(id)
        .map_err(dependency("delete transaction"))?;
    if !deleted {
        return Err(ServiceError::NotFound {
            entity: "Transaction",
            id,
        });
    }
    tracing::info!(id, "deleted transaction");
    Ok(())
}

// ── Sample data ───────────────────────────────────────────────

/// Replace everything with the demo data set.
pub(crate) fn seed_sample_data(db: &mut Database, today: NaiveDate) -> ServiceResult<SeedSummary> {
    let transactions = sample::transactions().map_err(dependency("add sample data"))?;
    let budgets = sample::budgets(today);
    let (transactions, budgets) = db
        .replace_all(&transactions, &budgets)
        .map_err(dependency("add sample data"))?;

    tracing::info!(transactions, budgets, "seeded sample data");
    Ok(SeedSummary {
        message: "Sample data added successfully".to_string(),
        transactions,
        budgets,
    })
}
