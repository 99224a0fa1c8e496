//! Derived reporting structures. Recomputed on every query, never persisted.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyExpense {
    /// Format: "YYYY-MM"
    pub month: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryExpense {
    pub category: String,
    pub amount: Decimal,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub monthly_expenses: Vec<MonthlyExpense>,
    pub category_expenses: Vec<CategoryExpense>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetVsActual {
    pub category: String,
    pub budget: Decimal,
    pub actual: Decimal,
    pub difference: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub category: String,
    pub amount: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdherenceStatus {
    OnTrack,
    OverBudget,
}

impl AdherenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on-track",
            Self::OverBudget => "over-budget",
        }
    }
}

impl std::fmt::Display for AdherenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAdherence {
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub adherence: Decimal,
    pub status: AdherenceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingInsights {
    pub current_month_spending: Decimal,
    pub last_month_spending: Decimal,
    pub month_over_month_change: Decimal,
    pub transaction_count: usize,
    pub categories_used: usize,
    pub top_categories: Vec<TopCategory>,
    pub budget_adherence: Vec<BudgetAdherence>,
    pub average_transaction_amount: Decimal,
}
