use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::display::{bar, format_amount, format_change, format_percent, truncate};
use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{Budget, Transaction, PREDEFINED};
use crate::service::{self, BudgetInput, TransactionInput, TransactionQuery};

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &["--type", "--from", "--to", "--category", "--month", "--year"];

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    let rest = &args[2..];
    let json = rest.iter().any(|a| a == "--json");
    let today = Local::now().date_naive();

    match command.as_str() {
        "transactions" | "t" => cli_transactions(rest, db, json),
        "add" | "a" => cli_add(rest, db, json),
        "edit" => cli_edit(rest, db, json),
        "delete" => cli_delete(rest, db, json),
        "budgets" | "b" => cli_budgets(rest, db, json),
        "set-budget" => cli_set_budget(rest, db, json),
        "delete-budget" => cli_delete_budget(rest, db, json),
        "compare" | "c" => cli_compare(rest, db, json),
        "charts" => cli_charts(db, today, json),
        "insights" | "i" => cli_insights(db, today, json),
        "seed" => cli_seed(db, today, json),
        "categories" => cli_categories(json),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("fintrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("FinTrack: personal income, expense and budget tracker");
    println!();
    println!("Usage: fintrack <command> [--json]");
    println!();
    println!("Commands:");
    println!("  transactions                          List transactions, newest first");
    println!("    --type <income|expense>             Only this kind");
    println!("    --from <YYYY-MM-DD>                 On or after this date");
    println!("    --to <YYYY-MM-DD>                   On or before this date");
    println!("    --category <name>                   Only this category");
    println!("  add <amount> <date> <description>     Record a transaction");
    println!("    --type <income|expense>             Required");
    println!("    --category <name>                   Defaults to Other");
    println!("  edit <id> <amount> <date> <desc>      Replace a transaction's fields");
    println!("  delete <id>                           Delete a transaction");
    println!("  budgets [--month <MM>] [--year <YYYY>]  List budgets");
    println!("  set-budget <category> <amount>        Create or update a monthly budget");
    println!("    --month <MM> --year <YYYY>          Required");
    println!("  delete-budget <id>                    Delete a budget");
    println!("  compare <MM> <YYYY>                   Budget vs actual for a month");
    println!("  charts                                Monthly and per-category spending");
    println!("  insights                              Spending insights for this month");
    println!("  seed                                  Replace all data with sample data");
    println!("  categories                            List predefined categories");
    println!("  --help, -h                            Show this help");
    println!("  --version, -V                         Show version");
    println!();
    println!("Every command accepts --json to print the raw response.");
}

// ── Argument helpers ──────────────────────────────────────────

fn flag(args: &[String], name: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].clone())
}

/// Arguments that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_id(raw: Option<&&str>, usage: &str) -> Result<i64> {
    let raw = raw.ok_or_else(|| anyhow::anyhow!("Usage: {usage}"))?;
    raw.parse()
        .with_context(|| format!("Invalid id: {raw}"))
}

/// Positional `<amount> <date> <description...>` plus `--type`/`--category`.
fn transaction_input(fields: &[&str], args: &[String]) -> TransactionInput {
    TransactionInput {
        amount: fields.first().map(|s| s.to_string()),
        date: fields.get(1).map(|s| s.to_string()),
        description: fields
            .get(2..)
            .filter(|words| !words.is_empty())
            .map(|words| words.join(" ")),
        category: flag(args, "--category"),
        kind: flag(args, "--type"),
    }
}

/// Strip internal detail; only the user-facing message and its class escape.
fn fail(err: ServiceError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", err.user_message(), err.status())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Transactions ──────────────────────────────────────────────

fn cli_transactions(args: &[String], db: &Database, json: bool) -> Result<()> {
    let query = TransactionQuery {
        kind: flag(args, "--type"),
        from: flag(args, "--from"),
        to: flag(args, "--to"),
        category: flag(args, "--category"),
    };
    let txns = service::list_transactions(db, &query).map_err(fail)?;
    if json {
        return print_json(&txns);
    }
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<8} {:<16} {:<28} {:>12}",
        "ID", "Date", "Type", "Category", "Description", "Amount"
    );
    println!("{}", "─".repeat(84));
    for txn in &txns {
        print_transaction_row(txn);
    }
    Ok(())
}

fn print_transaction_row(txn: &Transaction) {
    println!(
        "{:<5} {:<10} {:<8} {:<16} {:<28} {:>12}",
        txn.id.unwrap_or(0),
        txn.date.format("%Y-%m-%d"),
        txn.kind.as_str(),
        truncate(&txn.category, 16),
        truncate(&txn.description, 28),
        format_amount(txn.amount),
    );
}

fn cli_add(args: &[String], db: &Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let input = transaction_input(&fields, args);
    let txn = service::create_transaction(db, &input).map_err(fail)?;
    if json {
        return print_json(&txn);
    }
    println!("Added transaction {}", txn.id.unwrap_or(0));
    print_transaction_row(&txn);
    Ok(())
}

fn cli_edit(args: &[String], db: &Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let id = parse_id(
        fields.first(),
        "fintrack edit <id> <amount> <date> <description> --type <income|expense>",
    )?;
    let input = transaction_input(fields.get(1..).unwrap_or_default(), args);
    let txn = service::update_transaction(db, id, &input).map_err(fail)?;
    if json {
        return print_json(&txn);
    }
    println!("Updated transaction {id}");
    print_transaction_row(&txn);
    Ok(())
}

fn cli_delete(args: &[String], db: &Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let id = parse_id(fields.first(), "fintrack delete <id>")?;
    service::delete_transaction(db, id).map_err(fail)?;
    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted transaction {id}");
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budgets(args: &[String], db: &Database, json: bool) -> Result<()> {
    let month = flag(args, "--month");
    let year = flag(args, "--year");
    let budgets = service::list_budgets(db, month.as_deref(), year.as_deref()).map_err(fail)?;
    if json {
        return print_json(&budgets);
    }
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }

    println!("{:<5} {:<8} {:<20} {:>12}", "ID", "Period", "Category", "Budget");
    println!("{}", "─".repeat(48));
    for budget in &budgets {
        print_budget_row(budget);
    }
    Ok(())
}

fn print_budget_row(budget: &Budget) {
    println!(
        "{:<5} {:<8} {:<20} {:>12}",
        budget.id.unwrap_or(0),
        format!("{}-{}", budget.year, budget.month),
        truncate(&budget.category, 20),
        format_amount(budget.amount),
    );
}

fn cli_set_budget(args: &[String], db: &mut Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let input = BudgetInput {
        category: fields.first().map(|s| s.to_string()),
        amount: fields.get(1).map(|s| s.to_string()),
        month: flag(args, "--month"),
        year: flag(args, "--year"),
    };
    let saved = service::create_budget(db, &input).map_err(fail)?;
    if json {
        return print_json(&saved);
    }
    let verb = if saved.updated { "Updated" } else { "Created" };
    println!("{verb} budget {}", saved.budget.id.unwrap_or(0));
    print_budget_row(&saved.budget);
    Ok(())
}

fn cli_delete_budget(args: &[String], db: &Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let id = parse_id(fields.first(), "fintrack delete-budget <id>")?;
    service::delete_budget(db, id).map_err(fail)?;
    if json {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    println!("Deleted budget {id}");
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_compare(args: &[String], db: &Database, json: bool) -> Result<()> {
    let fields = positionals(args);
    let rows =
        service::budget_vs_actual(db, fields.first().copied(), fields.get(1).copied())
            .map_err(fail)?;
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No budgets or spending for this month");
        return Ok(());
    }

    println!(
        "{:<18} {:>12} {:>12} {:>12} {:>8}  Used",
        "Category", "Budget", "Actual", "Remaining", "%"
    );
    println!("{}", "─".repeat(80));
    for row in &rows {
        println!(
            "{:<18} {:>12} {:>12} {:>12} {:>8}  {}",
            truncate(&row.category, 18),
            format_amount(row.budget),
            format_amount(row.actual),
            format_amount(row.difference),
            format_percent(row.percentage),
            bar(row.percentage, 10),
        );
    }
    Ok(())
}

fn cli_charts(db: &Database, today: NaiveDate, json: bool) -> Result<()> {
    let data = service::chart_data(db, today).map_err(fail)?;
    if json {
        return print_json(&data);
    }

    println!("Monthly expenses (last 12 months)");
    println!("{}", "─".repeat(40));
    if data.monthly_expenses.is_empty() {
        println!("  No expenses");
    }
    for point in &data.monthly_expenses {
        println!("  {:<10} {:>14}", point.month, format_amount(point.amount));
    }

    println!();
    println!("Expenses by category");
    println!("{}", "─".repeat(40));
    if data.category_expenses.is_empty() {
        println!("  No expenses");
    }
    for slice in &data.category_expenses {
        println!(
            "  {:<20} {:>14}  {}",
            truncate(&slice.category, 20),
            format_amount(slice.amount),
            slice.color,
        );
    }
    Ok(())
}

fn cli_insights(db: &Database, today: NaiveDate, json: bool) -> Result<()> {
    let report = service::insights(db, today).map_err(fail)?;
    if json {
        return print_json(&report);
    }

    println!("Insights for {}", today.format("%B %Y"));
    println!("{}", "─".repeat(40));
    println!("  This month:    {}", format_amount(report.current_month_spending));
    println!("  Last month:    {}", format_amount(report.last_month_spending));
    println!("  Change:        {}", format_change(report.month_over_month_change));
    println!("  Transactions:  {}", report.transaction_count);
    println!("  Categories:    {}", report.categories_used);
    println!("  Average:       {}", format_amount(report.average_transaction_amount));

    if !report.top_categories.is_empty() {
        println!();
        println!("Top categories:");
        for top in &report.top_categories {
            println!(
                "  {:<20} {:>12}  ({} txns)",
                truncate(&top.category, 20),
                format_amount(top.amount),
                top.transaction_count,
            );
        }
    }

    if !report.budget_adherence.is_empty() {
        println!();
        println!("Budget adherence:");
        for row in &report.budget_adherence {
            println!(
                "  {:<20} {:>12} of {:>12}  {:>8}  {}",
                truncate(&row.category, 20),
                format_amount(row.spent),
                format_amount(row.budget),
                format_percent(row.adherence),
                row.status,
            );
        }
    }
    Ok(())
}

fn cli_seed(db: &mut Database, today: NaiveDate, json: bool) -> Result<()> {
    let summary = service::seed_sample_data(db, today).map_err(fail)?;
    if json {
        return print_json(&summary);
    }
    println!(
        "{} ({} transactions, {} budgets)",
        summary.message, summary.transactions, summary.budgets
    );
    Ok(())
}

fn cli_categories(json: bool) -> Result<()> {
    if json {
        let names: Vec<serde_json::Value> = PREDEFINED
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "color": c.color }))
            .collect();
        return print_json(&names);
    }
    for category in PREDEFINED {
        println!("  {:<20} {}", category.to_string(), category.color);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cli(list: &[&str], db: &mut Database) -> Result<()> {
        let mut full = args(&["fintrack"]);
        full.extend(args(list));
        as_cli(&full, db)
    }

    #[test]
    fn test_positionals_skip_flag_values() {
        let a = args(&["12.50", "--type", "expense", "2024-03-01", "--json", "Coffee", "beans"]);
        assert_eq!(positionals(&a), vec!["12.50", "2024-03-01", "Coffee", "beans"]);
    }

    #[test]
    fn test_flag_lookup() {
        let a = args(&["--month", "03", "--year", "2024"]);
        assert_eq!(flag(&a, "--month").as_deref(), Some("03"));
        assert_eq!(flag(&a, "--year").as_deref(), Some("2024"));
        assert_eq!(flag(&a, "--category"), None);
    }

    #[test]
    fn test_flag_without_value_is_absent() {
        let a = args(&["--type"]);
        assert_eq!(flag(&a, "--type"), None);
    }

    #[test]
    fn test_transaction_input_joins_description() {
        let a = args(&["45.5", "2024-03-10", "Weekly", "groceries", "--type", "expense"]);
        let fields = positionals(&a);
        let input = transaction_input(&fields, &a);
        assert_eq!(input.amount.as_deref(), Some("45.5"));
        assert_eq!(input.date.as_deref(), Some("2024-03-10"));
        assert_eq!(input.description.as_deref(), Some("Weekly groceries"));
        assert_eq!(input.kind.as_deref(), Some("expense"));
        assert_eq!(input.category, None);
    }

    #[test]
    fn test_transaction_input_missing_description() {
        let a = args(&["45.5", "2024-03-10"]);
        let fields = positionals(&a);
        assert_eq!(transaction_input(&fields, &a).description, None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(&"42"), "x").unwrap(), 42);
        assert!(parse_id(Some(&"abc"), "x").is_err());
        assert!(parse_id(None, "fintrack delete <id>").is_err());
    }

    #[test]
    fn test_fail_hides_dependency_detail() {
        let err = ServiceError::Dependency {
            action: "fetch insights",
            source: anyhow::anyhow!("disk I/O error at page 7"),
        };
        let msg = format!("{:#}", fail(err));
        assert_eq!(msg, "Failed to fetch insights (500)");
    }

    #[test]
    fn test_cli_add_and_list() {
        let mut db = Database::open_in_memory().unwrap();
        cli(
            &["add", "12.50", "2024-03-01", "Coffee", "--type", "expense", "--category", "Food"],
            &mut db,
        )
        .unwrap();
        cli(&["transactions", "--json"], &mut db).unwrap();

        let txns = service::list_transactions(&db, &TransactionQuery::default()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].category, "Food");
    }

    #[test]
    fn test_cli_add_validation_error() {
        let mut db = Database::open_in_memory().unwrap();
        let err = cli(&["add", "12.50", "2024-03-01", "Coffee"], &mut db).unwrap_err();
        assert!(err.to_string().contains("(400)"));
    }

    #[test]
    fn test_cli_delete_missing_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let err = cli(&["delete", "99"], &mut db).unwrap_err();
        assert!(err.to_string().contains("(404)"));
    }

    #[test]
    fn test_cli_set_budget_and_compare() {
        let mut db = Database::open_in_memory().unwrap();
        cli(
            &["set-budget", "Food", "500", "--month", "03", "--year", "2024"],
            &mut db,
        )
        .unwrap();
        cli(&["compare", "03", "2024"], &mut db).unwrap();
        cli(&["budgets", "--month", "03", "--year", "2024", "--json"], &mut db).unwrap();

        let budgets = service::list_budgets(&db, Some("03"), Some("2024")).unwrap();
        assert_eq!(budgets.len(), 1);
    }

    #[test]
    fn test_cli_reports_on_seeded_data() {
        let mut db = Database::open_in_memory().unwrap();
        cli(&["seed"], &mut db).unwrap();
        cli(&["charts"], &mut db).unwrap();
        cli(&["insights"], &mut db).unwrap();
        cli(&["insights", "--json"], &mut db).unwrap();
    }

    #[test]
    fn test_cli_categories() {
        let mut db = Database::open_in_memory().unwrap();
        cli(&["categories"], &mut db).unwrap();
        cli(&["categories", "--json"], &mut db).unwrap();
    }

    #[test]
    fn test_handlers_work_on_shared_database() {
        let db = Database::open_in_memory().unwrap();
        let add = args(&["9.99", "2024-01-05", "Lunch", "--type", "expense"]);
        cli_add(&add, &db, true).unwrap();
        cli_transactions(&[], &db, false).unwrap();
        cli_budgets(&[], &db, false).unwrap();
        cli_compare(&args(&["01", "2024"]), &db, false).unwrap();
        cli_charts(&db, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(), false).unwrap();
        cli_insights(&db, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(), false).unwrap();
        cli_delete(&args(&["1"]), &db, false).unwrap();
        assert!(cli_delete_budget(&args(&["1"]), &db, false).is_err());
    }

    #[test]
    fn test_text_reports_with_extreme_amounts() {
        let mut db = Database::open_in_memory().unwrap();
        let tiny = rust_decimal::Decimal::from_parts(1, 0, 0, false, 28);
        db.upsert_budget(&Budget::new("Groceries".into(), tiny, "01".into(), 2024))
            .unwrap();
        let txn = Transaction::new(
            rust_decimal::Decimal::MAX,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            "Imported".into(),
            Some("Groceries".into()),
            crate::models::TransactionKind::Expense,
        );
        db.insert_transaction(&txn).unwrap();

        cli_compare(&args(&["01", "2024"]), &db, false).unwrap();
        cli_charts(&db, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), false).unwrap();
        cli_insights(&db, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(), false).unwrap();
    }

    #[test]
    fn test_cli_unknown_command() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(cli(&["frobnicate"], &mut db).is_err());
    }

    #[test]
    fn test_cli_no_command_prints_usage() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(as_cli(&args(&["fintrack"]), &mut db).is_ok());
    }
}
