//! Amount validation and balance folding over the stored history.
//!
//! Amounts are whole currency units. Both `.` and `,` are grouping
//! separators and are dropped before parsing; there is no decimal point, so
//! `"12.50"` is read as 1250.

use crate::error::AmountError;
use crate::models::transaction::{Kind, Stored, StoredAmount, Transaction};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::warn;

pub const GROUPING_SEPARATORS: [char; 2] = ['.', ','];

/// Largest amount accepted: 2^53. The `amount` column is REAL, and every
/// whole number up to here survives the trip through an `f64` unchanged.
pub const MAX_AMOUNT: i64 = 9_007_199_254_740_992;

/// Turn user-typed amount text into a non-negative whole amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let digits: String = trimmed
        .chars()
        .filter(|c| !GROUPING_SEPARATORS.contains(c))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::NotANumber(trimmed.to_string()));
    }

    let amount =
        Decimal::from_str(&digits).map_err(|_| AmountError::OutOfRange(trimmed.to_string()))?;
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(AmountError::OutOfRange(trimmed.to_string()));
    }
    Ok(amount)
}

/// Income minus expense over every transaction. Rows with an unreadable
/// amount or type, or whose amount would overflow the total, are logged and
/// left out of the sum.
pub fn compute_balance(transactions: &[Transaction]) -> Decimal {
    transactions.iter().fold(Decimal::ZERO, |balance, tx| {
        let (kind, amount) = match (&tx.kind, &tx.amount) {
            (Stored::Valid(kind), Stored::Valid(amount)) => (*kind, *amount),
            (Stored::Malformed(raw), _) => {
                warn!(id = tx.id, kind = %raw, "skipping transaction with unknown type");
                return balance;
            }
            (_, Stored::Malformed(raw)) => {
                warn!(id = tx.id, amount = %raw, "skipping transaction with invalid amount");
                return balance;
            }
        };

        let next = match kind {
            Kind::Income => balance.checked_add(amount),
            Kind::Expense => balance.checked_sub(amount),
        };
        next.unwrap_or_else(|| {
            warn!(id = tx.id, %amount, "skipping transaction that overflows the balance");
            balance
        })
    })
}

/// Render an amount rounded to whole units with `,` between thousands,
/// e.g. `-1,234,567`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Table/list rendering of a stored amount. Unreadable values are shown
/// as-is behind a `?` so the row is still visible.
pub fn display_stored_amount(amount: &StoredAmount) -> String {
    match amount {
        StoredAmount::Valid(value) => format_amount(*value),
        StoredAmount::Malformed(raw) => format!("? ({})", raw),
    }
}
