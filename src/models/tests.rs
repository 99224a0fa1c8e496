#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Transaction ───────────────────────────────────────────────

#[test]
fn test_transaction_kind_parse() {
    assert_eq!(TransactionKind::parse("income"), Some(TransactionKind::Income));
    assert_eq!(TransactionKind::parse("EXPENSE"), Some(TransactionKind::Expense));
    assert_eq!(TransactionKind::parse(" expense "), Some(TransactionKind::Expense));
    assert_eq!(TransactionKind::parse("transfer"), None);
    assert_eq!(TransactionKind::parse(""), None);
}

#[test]
fn test_transaction_kind_roundtrip() {
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
    }
}

#[test]
fn test_transaction_new_defaults_category() {
    let txn = Transaction::new(
        dec!(12.00),
        date(2024, 1, 5),
        "Lunch".into(),
        None,
        TransactionKind::Expense,
    );
    assert!(txn.id.is_none());
    assert_eq!(txn.category, "Other");
    assert!(txn.is_expense());
    assert_eq!(txn.created_at, txn.updated_at);
}

#[test]
fn test_normalize_category() {
    assert_eq!(normalize_category(None), "Other");
    assert_eq!(normalize_category(Some("   ".into())), "Other");
    assert_eq!(normalize_category(Some(" Travel ".into())), "Travel");
}

#[test]
fn test_transaction_serializes_type_field() {
    let txn = Transaction::new(
        dec!(45.50),
        date(2024, 1, 14),
        "Grocery shopping".into(),
        Some("Groceries".into()),
        TransactionKind::Expense,
    );
    let json = serde_json::to_value(&txn).unwrap();
    assert_eq!(json["type"], "expense");
    assert_eq!(json["date"], "2024-01-14");
    assert_eq!(json["amount"], 45.5);
    assert!(json.get("createdAt").is_some());
}

// ── Budget ────────────────────────────────────────────────────

#[test]
fn test_budget_new() {
    let budget = Budget::new("Groceries".into(), dec!(500), "01".into(), 2024);
    assert!(budget.id.is_none());
    assert!(budget.is_for("01", 2024));
    assert!(!budget.is_for("1", 2024));
    assert!(!budget.is_for("01", 2023));
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_color_lookup() {
    assert_eq!(Category::color_for("Groceries"), "#BB8FCE");
    assert_eq!(Category::color_for("Food & Dining"), "#FF6B6B");
    assert_eq!(Category::color_for("Other"), DEFAULT_COLOR);
}

#[test]
fn test_category_color_fallback() {
    assert_eq!(Category::color_for("Pets"), DEFAULT_COLOR);
    // Lookup is exact, not case-insensitive
    assert_eq!(Category::color_for("groceries"), DEFAULT_COLOR);
}

#[test]
fn test_predefined_includes_default() {
    assert!(Category::find_by_name(DEFAULT_CATEGORY).is_some());
    assert_eq!(PREDEFINED.len(), 10);
}

// ── MonthPeriod ───────────────────────────────────────────────

#[test]
fn test_period_rejects_invalid_month() {
    assert!(MonthPeriod::new(2024, 0).is_none());
    assert!(MonthPeriod::new(2024, 13).is_none());
    assert!(MonthPeriod::new(2024, 12).is_some());
}

#[test]
fn test_period_bounds() {
    let feb = MonthPeriod::new(2024, 2).unwrap();
    assert_eq!(feb.first_day(), date(2024, 2, 1));
    assert_eq!(feb.last_day(), date(2024, 2, 29));

    let dec = MonthPeriod::new(2023, 12).unwrap();
    assert_eq!(dec.last_day(), date(2023, 12, 31));
}

#[test]
fn test_period_contains_is_inclusive() {
    let jan = MonthPeriod::new(2024, 1).unwrap();
    assert!(jan.contains(date(2024, 1, 1)));
    assert!(jan.contains(date(2024, 1, 31)));
    assert!(!jan.contains(date(2023, 12, 31)));
    assert!(!jan.contains(date(2024, 2, 1)));
}

#[test]
fn test_period_previous_rolls_year() {
    let jan = MonthPeriod::new(2024, 1).unwrap();
    assert_eq!(jan.previous(), MonthPeriod::new(2023, 12).unwrap());
    let jul = MonthPeriod::new(2024, 7).unwrap();
    assert_eq!(jul.previous(), MonthPeriod::new(2024, 6).unwrap());
}

#[test]
fn test_period_formatting() {
    let p = MonthPeriod::containing(date(2024, 3, 17));
    assert_eq!(p.month_str(), "03");
    assert_eq!(p.key(), "2024-03");
    assert_eq!(format!("{p}"), "2024-03");
}

// ── Reports ───────────────────────────────────────────────────

#[test]
fn test_adherence_status_serializes_kebab() {
    let json = serde_json::to_value(AdherenceStatus::OverBudget).unwrap();
    assert_eq!(json, "over-budget");
    assert_eq!(AdherenceStatus::OnTrack.as_str(), "on-track");
}

#[test]
fn test_chart_data_field_names() {
    let data = ChartData {
        monthly_expenses: vec![],
        category_expenses: vec![CategoryExpense {
            category: "Other".into(),
            amount: Decimal::ZERO,
            color: DEFAULT_COLOR.into(),
        }],
    };
    let json = serde_json::to_value(&data).unwrap();
    assert!(json["monthlyExpenses"].as_array().unwrap().is_empty());
    assert_eq!(json["categoryExpenses"][0]["color"], DEFAULT_COLOR);
}
