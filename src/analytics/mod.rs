//! Aggregation pipeline: pure functions over fetched transaction and budget
//! snapshots. Absence of records yields zero-valued or empty results, every
//! percentage is guarded against a zero denominator, and sums saturate at
//! `Decimal::MAX` instead of overflowing.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::*;

/// How far back the monthly chart series reaches.
pub(crate) const CHART_WINDOW_MONTHS: u32 = 12;

/// How many categories the insights report ranks.
pub(crate) const TOP_CATEGORY_LIMIT: usize = 5;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Expense total and transaction count for one category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub(crate) category: String,
    pub(crate) amount: Decimal,
    pub(crate) count: usize,
}

/// Sum expense transactions by category, keeping categories in the order
/// they first appear in the input.
pub(crate) fn expenses_by_category<'a, I>(transactions: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for txn in transactions.into_iter().filter(|t| t.is_expense()) {
        let category = if txn.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            txn.category.as_str()
        };
        match index.get(category) {
            Some(&i) => {
                totals[i].amount = totals[i].amount.saturating_add(txn.amount);
                totals[i].count += 1;
            }
            None => {
                index.insert(category.to_string(), totals.len());
                totals.push(CategoryTotal {
                    category: category.to_string(),
                    amount: txn.amount,
                    count: 1,
                });
            }
        }
    }

    totals
}

/// Full outer join of two keyed collections.
///
/// Rows come out in left order first, then right-only keys in right order.
/// Duplicate keys on either side keep their first occurrence.
pub(crate) fn outer_join<K, L, R>(
    left: Vec<(K, L)>,
    right: Vec<(K, R)>,
) -> Vec<(K, Option<L>, Option<R>)>
where
    K: Eq + std::hash::Hash + Clone,
{
    let mut right_order: Vec<K> = Vec::with_capacity(right.len());
    let mut right_map: HashMap<K, R> = HashMap::with_capacity(right.len());
    for (key, value) in right {
        if !right_map.contains_key(&key) {
            right_order.push(key.clone());
            right_map.insert(key, value);
        }
    }

    let mut seen: HashSet<K> = HashSet::new();
    let mut rows = Vec::with_capacity(left.len() + right_order.len());
    for (key, value) in left {
        if !seen.insert(key.clone()) {
            continue;
        }
        let matched = right_map.remove(&key);
        rows.push((key, Some(value), matched));
    }
    for key in right_order {
        if let Some(value) = right_map.remove(&key) {
            rows.push((key, None, Some(value)));
        }
    }

    rows
}

/// `part / whole * 100`, or zero when `whole` is not positive. A quotient
/// too large to represent saturates at `Decimal::MAX`.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::ZERO {
        part.checked_div(whole)
            .map_or(Decimal::MAX, |ratio| ratio.saturating_mul(HUNDRED))
    } else {
        Decimal::ZERO
    }
}

fn saturating_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

// ── Budget vs actual ──────────────────────────────────────────

/// Compare the budgets of `period` against expense spending inside it.
///
/// One row per category found in the budgets or the period's spending. Rows
/// with no budget report `budget = 0` and `percentage = 0`.
pub(crate) fn budget_vs_actual(
    period: MonthPeriod,
    budgets: &[Budget],
    transactions: &[Transaction],
) -> Vec<BudgetVsActual> {
    let month = period.month_str();
    let budget_side: Vec<(String, Decimal)> = budgets
        .iter()
        .filter(|b| b.is_for(&month, period.year()))
        .map(|b| (b.category.clone(), b.amount))
        .collect();
    let actual_side: Vec<(String, Decimal)> =
        expenses_by_category(transactions.iter().filter(|t| period.contains(t.date)))
            .into_iter()
            .map(|t| (t.category, t.amount))
            .collect();

    outer_join(budget_side, actual_side)
        .into_iter()
        .map(|(category, budget, actual)| {
            let budget = budget.unwrap_or(Decimal::ZERO);
            let actual = actual.unwrap_or(Decimal::ZERO);
            BudgetVsActual {
                category,
                budget,
                actual,
                difference: budget.saturating_sub(actual),
                percentage: percent_of(actual, budget),
            }
        })
        .collect()
}

// ── Charts ────────────────────────────────────────────────────

/// First day included in the monthly chart series.
pub(crate) fn chart_window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(CHART_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

/// Expense totals per month since `since`, oldest first. Months without
/// transactions are omitted.
pub(crate) fn monthly_expenses(
    transactions: &[Transaction],
    since: NaiveDate,
) -> Vec<MonthlyExpense> {
    let mut totals: BTreeMap<MonthPeriod, Decimal> = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.is_expense() && t.date >= since) {
        let total = totals.entry(MonthPeriod::containing(txn.date)).or_default();
        *total = total.saturating_add(txn.amount);
    }

    totals
        .into_iter()
        .map(|(period, amount)| MonthlyExpense {
            month: period.key(),
            amount,
        })
        .collect()
}

/// All-time expense totals per category, each tagged with its chart color.
pub(crate) fn category_expenses(transactions: &[Transaction]) -> Vec<CategoryExpense> {
    expenses_by_category(transactions)
        .into_iter()
        .map(|t| CategoryExpense {
            color: Category::color_for(&t.category).to_string(),
            category: t.category,
            amount: t.amount,
        })
        .collect()
}

/// The monthly series is windowed to the trailing year; the category series
/// covers all time.
pub(crate) fn chart_data(today: NaiveDate, transactions: &[Transaction]) -> ChartData {
    ChartData {
        monthly_expenses: monthly_expenses(transactions, chart_window_start(today)),
        category_expenses: category_expenses(transactions),
    }
}

// ── Insights ──────────────────────────────────────────────────

pub(crate) fn top_categories(totals: &[CategoryTotal], limit: usize) -> Vec<TopCategory> {
    let mut ranked: Vec<&CategoryTotal> = totals.iter().collect();
    // stable: equal amounts keep first-seen order
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount));
    ranked
        .into_iter()
        .take(limit)
        .map(|t| TopCategory {
            category: t.category.clone(),
            amount: t.amount,
            transaction_count: t.count,
        })
        .collect()
}

/// Adherence of each budget in `period`. Categories with spending but no
/// budget are not reported here.
pub(crate) fn budget_adherence(
    period: MonthPeriod,
    budgets: &[Budget],
    totals: &[CategoryTotal],
) -> Vec<BudgetAdherence> {
    let month = period.month_str();
    budgets
        .iter()
        .filter(|b| b.is_for(&month, period.year()))
        .map(|b| {
            let spent = totals
                .iter()
                .find(|t| t.category == b.category)
                .map_or(Decimal::ZERO, |t| t.amount);
            BudgetAdherence {
                category: b.category.clone(),
                budget: b.amount,
                spent,
                adherence: percent_of(spent, b.amount),
                status: if spent <= b.amount {
                    AdherenceStatus::OnTrack
                } else {
                    AdherenceStatus::OverBudget
                },
            }
        })
        .collect()
}

/// Spending summary for the calendar month containing `today`, compared
/// against the month before it.
pub(crate) fn spending_insights(
    today: NaiveDate,
    transactions: &[Transaction],
    budgets: &[Budget],
) -> SpendingInsights {
    let current = MonthPeriod::containing(today);
    let last = current.previous();

    let current_totals =
        expenses_by_category(transactions.iter().filter(|t| current.contains(t.date)));
    let current_total = saturating_sum(current_totals.iter().map(|t| t.amount));
    let transaction_count: usize = current_totals.iter().map(|t| t.count).sum();
    let last_total = saturating_sum(
        transactions
            .iter()
            .filter(|t| t.is_expense() && last.contains(t.date))
            .map(|t| t.amount),
    );

    let month_over_month_change =
        percent_of(current_total.saturating_sub(last_total), last_total);
    let average_transaction_amount = current_total
        .checked_div(Decimal::from(transaction_count))
        .unwrap_or(Decimal::ZERO);

    SpendingInsights {
        current_month_spending: current_total,
        last_month_spending: last_total,
        month_over_month_change,
        transaction_count,
        categories_used: current_totals.len(),
        top_categories: top_categories(&current_totals, TOP_CATEGORY_LIMIT),
        budget_adherence: budget_adherence(current, budgets, &current_totals),
        average_transaction_amount,
    }
}
