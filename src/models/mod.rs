mod budget;
mod category;
mod period;
mod reports;
mod transaction;

pub use budget::Budget;
pub use category::{Category, DEFAULT_CATEGORY, DEFAULT_COLOR, PREDEFINED};
pub use period::MonthPeriod;
pub use reports::{
    AdherenceStatus, BudgetAdherence, BudgetVsActual, CategoryExpense, ChartData, MonthlyExpense,
    SpendingInsights, TopCategory,
};
pub use transaction::{normalize_category, Transaction, TransactionKind};

#[cfg(test)]
mod tests;
