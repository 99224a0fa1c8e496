use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Option<i64>,
    pub category: String,
    pub amount: Decimal,
    /// Format: "01".."12"
    pub month: String,
    pub year: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Budget {
    pub fn new(category: String, amount: Decimal, month: String, year: i32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            category,
            amount,
            month,
            year,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// True when this budget belongs to the given (month, year) pair.
    pub fn is_for(&self, month: &str, year: i32) -> bool {
        self.month == month && self.year == year
    }
}
