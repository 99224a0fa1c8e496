use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"$1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO && abs > Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// One decimal place with a trailing `%`, e.g. `9.0909` → `"9.1%"`.
pub(crate) fn format_percent(val: Decimal) -> String {
    let rounded = val.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}%")
}

/// Like [`format_percent`] but always signed, for period-over-period change.
pub(crate) fn format_change(val: Decimal) -> String {
    if val > Decimal::ZERO {
        format!("+{}", format_percent(val))
    } else {
        format_percent(val)
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Horizontal bar for a share of 100%, capped at `width` cells.
pub(crate) fn bar(percent: Decimal, width: usize) -> String {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let cells = (percent * Decimal::from(width) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(width)
        .min(width);
    format!("{}{}", "█".repeat(cells), "░".repeat(width - cells))
}
