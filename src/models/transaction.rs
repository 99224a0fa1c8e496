use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::category::DEFAULT_CATEGORY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Strict parse: anything other than income/expense is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    pub fn new(
        amount: Decimal,
        date: NaiveDate,
        description: String,
        category: Option<String>,
        kind: TransactionKind,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            amount,
            date,
            description,
            category: normalize_category(category),
            kind,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Blank or missing categories fall back to "Other".
pub fn normalize_category(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}
