mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::models::*;

const TRANSACTION_COLUMNS: &str =
    "id, amount, date, description, category, kind, created_at, updated_at";
const BUDGET_COLUMNS: &str = "id, category, amount, month, year, created_at, updated_at";

/// Filter for transaction listings. Unset fields match everything; the date
/// range is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TransactionFilter {
    pub(crate) kind: Option<TransactionKind>,
    pub(crate) from: Option<NaiveDate>,
    pub(crate) to: Option<NaiveDate>,
    pub(crate) category: Option<String>,
}

impl TransactionFilter {
    pub(crate) fn expenses() -> Self {
        Self {
            kind: Some(TransactionKind::Expense),
            ..Self::default()
        }
    }

    pub(crate) fn expenses_between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::expenses()
        }
    }

    pub(crate) fn expenses_in(period: MonthPeriod) -> Self {
        Self::expenses_between(period.first_day(), period.last_day())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BudgetFilter {
    pub(crate) month: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) category: Option<String>,
}

impl BudgetFilter {
    pub(crate) fn for_period(period: MonthPeriod) -> Self {
        Self {
            month: Some(period.month_str()),
            year: Some(period.year()),
            category: None,
        }
    }
}

/// Result of writing a budget by its (category, month, year) key.
#[derive(Debug, Clone)]
pub(crate) struct BudgetUpsert {
    pub(crate) budget: Budget,
    pub(crate) created: bool,
}

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(version = schema::CURRENT_VERSION, "created database schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(from = current, to = schema::CURRENT_VERSION, "migrated database");
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        insert_transaction_on(&self.conn, txn)?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], transaction_from_row)
            .optional()?)
    }

    /// Matching transactions, newest first.
    pub(crate) fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1=1");
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND kind = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }
        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(from));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(to));
        }
        if let Some(category) = &filter.category {
            sql.push_str(&format!(" AND category = ?{}", param_values.len() + 1));
            param_values.push(Box::new(category.clone()));
        }

        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Overwrite every user-editable field. Returns false when no row has `id`.
    pub(crate) fn update_transaction(&self, id: i64, txn: &Transaction) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions
             SET amount = ?1, date = ?2, description = ?3, category = ?4, kind = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                txn.amount.to_string(),
                txn.date,
                txn.description,
                txn.category,
                txn.kind.as_str(),
                txn.updated_at,
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        budget_by_id_on(&self.conn, id)
    }

    /// Matching budgets, latest period first, then in creation order.
    pub(crate) fn get_budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        let mut sql = format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE 1=1");
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(month) = &filter.month {
            sql.push_str(&format!(" AND month = ?{}", param_values.len() + 1));
            param_values.push(Box::new(month.clone()));
        }
        if let Some(year) = filter.year {
            sql.push_str(&format!(" AND year = ?{}", param_values.len() + 1));
            param_values.push(Box::new(year));
        }
        if let Some(category) = &filter.category {
            sql.push_str(&format!(" AND category = ?{}", param_values.len() + 1));
            param_values.push(Box::new(category.clone()));
        }

        sql.push_str(" ORDER BY year DESC, month DESC, id ASC");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Insert a budget, or update the amount of the one already holding its
    /// (category, month, year) key.
    ///
    /// The lookup and the write share an IMMEDIATE transaction, so the write
    /// lock is held across both and concurrent writers cannot duplicate a key.
    pub(crate) fn upsert_budget(&mut self, budget: &Budget) -> Result<BudgetUpsert> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM budgets WHERE category = ?1 AND month = ?2 AND year = ?3",
                params![budget.category, budget.month, budget.year],
                |row| row.get(0),
            )
            .optional()?;

        let (id, created) = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE budgets SET amount = ?1, updated_at = ?2 WHERE id = ?3",
                    params![budget.amount.to_string(), budget.updated_at, id],
                )?;
                (id, false)
            }
            None => {
                insert_budget_on(&tx, budget)?;
                (tx.last_insert_rowid(), true)
            }
        };

        let stored = budget_by_id_on(&tx, id)?
            .ok_or_else(|| anyhow::anyhow!("Budget {id} vanished during upsert"))?;
        tx.commit()?;
        Ok(BudgetUpsert {
            budget: stored,
            created,
        })
    }

    pub(crate) fn delete_budget(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // ── Bulk ──────────────────────────────────────────────────

    /// Replace all transactions and budgets in one transaction.
    /// Returns (transactions inserted, budgets inserted).
    pub(crate) fn replace_all(
        &mut self,
        transactions: &[Transaction],
        budgets: &[Budget],
    ) -> Result<(usize, usize)> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM budgets", [])?;
        for txn in transactions {
            insert_transaction_on(&tx, txn)?;
        }
        for budget in budgets {
            insert_budget_on(&tx, budget)?;
        }
        tx.commit()?;
        Ok((transactions.len(), budgets.len()))
    }
}

fn insert_transaction_on(conn: &Connection, txn: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions (amount, date, description, category, kind, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            txn.amount.to_string(),
            txn.date,
            txn.description,
            txn.category,
            txn.kind.as_str(),
            txn.created_at,
            txn.updated_at,
        ],
    )?;
    Ok(())
}

fn insert_budget_on(conn: &Connection, budget: &Budget) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets (category, amount, month, year, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            budget.category,
            budget.amount.to_string(),
            budget.month,
            budget.year,
            budget.created_at,
            budget.updated_at,
        ],
    )?;
    Ok(())
}

fn budget_by_id_on(conn: &Connection, id: i64) -> Result<Option<Budget>> {
    let sql = format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], budget_from_row).optional()?)
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(5)?;
    let kind = TransactionKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown transaction kind: {kind_str}").into(),
        )
    })?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        amount: decimal_at(row, 1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        kind,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: Some(row.get(0)?),
        category: row.get(1)?,
        amount: decimal_at(row, 2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
