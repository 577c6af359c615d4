use crate::db::repository::Store;
use crate::error::{AmountError, StoreError};
use crate::models::transaction::Kind;
use crate::operations::ledger::parse_amount;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unknown transaction type '{0}', use 'income' or 'expense'")]
    UnknownKind(String),
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate the typed amount and append the transaction dated `today`.
/// A bad amount returns before the store is opened.
pub fn record_transaction(
    store: &Store,
    kind: Kind,
    raw_amount: &str,
    description: &str,
    today: NaiveDate,
) -> Result<i64, RecordError> {
    let amount = parse_amount(raw_amount)?;
    let id = store.append(today, kind, amount, description.trim())?;
    info!(id, kind = kind.as_str(), %amount, "transaction recorded");
    Ok(id)
}

/// Same as [`record_transaction`] but with the type still as user text.
pub fn record_from_input(
    store: &Store,
    raw_kind: &str,
    raw_amount: &str,
    description: &str,
    today: NaiveDate,
) -> Result<i64, RecordError> {
    let kind = raw_kind.parse::<Kind>().map_err(RecordError::UnknownKind)?;
    record_transaction(store, kind, raw_amount, description, today)
}
