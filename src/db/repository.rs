use crate::db::connection::{establish_connection, unavailable, CREATE_TRANSACTIONS_TABLE};
use crate::error::StoreResult;
use crate::models::transaction::{Kind, NewTransaction, Stored, StoredAmount, Transaction};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rusqlite::types::Value;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Append-only transaction store backed by a single SQLite file.
///
/// The store keeps only the path. Every operation opens its own connection
/// and drops it before returning, on success and on error alike.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

/// Row exactly as SQLite hands it back, before any decoding.
struct RawRow {
    id: i64,
    date: Value,
    kind: Value,
    amount: Value,
    description: Value,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the transactions table if it does not exist yet. Existing rows
    /// are left untouched, so this runs on every startup.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        let conn = establish_connection(&self.path)?;
        conn.execute(CREATE_TRANSACTIONS_TABLE, [])
            .map_err(|e| unavailable(&self.path, e))?;
        debug!(path = %self.path.display(), "schema ready");
        Ok(())
    }

    /// Persist one transaction and return the id SQLite assigned to it.
    /// The amount must already be validated by the ledger.
    pub fn append(
        &self,
        date: NaiveDate,
        kind: Kind,
        amount: Decimal,
        description: &str,
    ) -> StoreResult<i64> {
        let conn = establish_connection(&self.path)?;
        let id = insert_row(&conn, date, kind, amount, description)
            .map_err(|e| unavailable(&self.path, e))?;
        debug!(id, kind = kind.as_str(), "transaction appended");
        Ok(id)
    }

    /// Persist several transactions in one SQLite transaction: either every
    /// row is committed or none is.
    pub fn append_all(&self, transactions: &[NewTransaction]) -> StoreResult<Vec<i64>> {
        let mut conn = establish_connection(&self.path)?;
        let tx = conn.transaction().map_err(|e| unavailable(&self.path, e))?;

        let mut ids = Vec::with_capacity(transactions.len());
        for new in transactions {
            let id = insert_row(&tx, new.date, new.kind, new.amount, &new.description)
                .map_err(|e| unavailable(&self.path, e))?;
            ids.push(id);
        }

        tx.commit().map_err(|e| unavailable(&self.path, e))?;
        debug!(count = ids.len(), "transactions appended");
        Ok(ids)
    }

    /// Every stored transaction in insertion order.
    pub fn read_all(&self) -> StoreResult<Vec<Transaction>> {
        let conn = establish_connection(&self.path)?;
        let mut stmt = conn
            .prepare("SELECT id, date, type, amount, description FROM transactions ORDER BY id ASC")
            .map_err(|e| unavailable(&self.path, e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    kind: row.get(2)?,
                    amount: row.get(3)?,
                    description: row.get(4)?,
                })
            })
            .map_err(|e| unavailable(&self.path, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| unavailable(&self.path, e))?;

        let transactions: Vec<Transaction> = rows.into_iter().map(decode_row).collect();
        debug!(count = transactions.len(), "transactions loaded");
        Ok(transactions)
    }
}

fn insert_row(
    conn: &Connection,
    date: NaiveDate,
    kind: Kind,
    amount: Decimal,
    description: &str,
) -> rusqlite::Result<i64> {
    let amount = amount.to_f64().ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure(
            format!("amount {} has no REAL representation", amount).into(),
        )
    })?;

    conn.execute(
        "INSERT INTO transactions (date, type, amount, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            date.format(DATE_FORMAT).to_string(),
            kind.as_str(),
            amount,
            description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Undecodable cells become `Stored::Malformed` so one bad row never hides
/// the rest of the history.
fn decode_row(raw: RawRow) -> Transaction {
    let date_text = column_text(raw.date);
    let date = match NaiveDate::parse_from_str(&date_text, DATE_FORMAT) {
        Ok(date) => Stored::Valid(date),
        Err(_) => {
            warn!(id = raw.id, date = %date_text, "transaction has an unreadable date");
            Stored::Malformed(date_text)
        }
    };

    let kind_text = column_text(raw.kind);
    let kind = match Kind::from_column(&kind_text) {
        Some(kind) => Stored::Valid(kind),
        None => {
            warn!(id = raw.id, kind = %kind_text, "transaction has an unknown type");
            Stored::Malformed(kind_text)
        }
    };

    Transaction {
        id: raw.id,
        date,
        kind,
        amount: decode_amount(raw.amount),
        description: column_text(raw.description),
    }
}

fn column_text(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        Value::Integer(int) => int.to_string(),
        Value::Real(real) => real.to_string(),
        Value::Null => String::new(),
        Value::Blob(bytes) => format!("<{} byte blob>", bytes.len()),
    }
}

fn decode_amount(value: Value) -> StoredAmount {
    match value {
        Value::Real(real) => match Decimal::from_f64(real) {
            Some(amount) => StoredAmount::Valid(amount),
            None => StoredAmount::Malformed(real.to_string()),
        },
        Value::Integer(int) => StoredAmount::Valid(Decimal::from(int)),
        Value::Text(text) => match Decimal::from_str(text.trim()) {
            Ok(amount) => StoredAmount::Valid(amount),
            Err(_) => StoredAmount::Malformed(text),
        },
        other => StoredAmount::Malformed(column_text(other)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::connection::establish_connection;
    use crate::error::StoreError;
    use rust_decimal_macros::dec;
    use tempfile::{tempdir, TempDir};

    /// Store on a fresh file in a temporary directory. Keep the `TempDir`
    /// alive for as long as the store is used.
    pub(crate) fn test_store() -> (TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("ledger.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_read_all_empty() {
        let (_dir, store) = test_store();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_round_trip() {
        let (_dir, store) = test_store();
        let day = date(2025, 3, 14);

        let id = store.append(day, Kind::Income, dec!(500), "salary").unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], Transaction::new(id, day, Kind::Income, dec!(500), "salary".to_string()));

        let again = store.read_all().unwrap();
        assert_eq!(again[0].id, id);
    }

    #[test]
    fn test_read_all_keeps_insertion_order() {
        let (_dir, store) = test_store();
        // Dates deliberately out of order; rows must still come back by id.
        store.append(date(2025, 5, 1), Kind::Income, dec!(1), "first").unwrap();
        store.append(date(2024, 1, 1), Kind::Expense, dec!(2), "second").unwrap();
        store.append(date(2025, 2, 1), Kind::Income, dec!(3), "third").unwrap();

        let all = store.read_all().unwrap();
        let descriptions: Vec<&str> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let (_dir, store) = test_store();
        let a = store.append(date(2025, 1, 1), Kind::Income, dec!(10), "").unwrap();
        let b = store.append(date(2025, 1, 1), Kind::Income, dec!(10), "").unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_empty_description_allowed() {
        let (_dir, store) = test_store();
        store.append(date(2025, 1, 1), Kind::Expense, dec!(7), "").unwrap();
        assert_eq!(store.read_all().unwrap()[0].description, "");
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let (_dir, store) = test_store();
        store.append(date(2025, 1, 1), Kind::Income, dec!(100), "keep me").unwrap();

        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "keep me");
    }

    #[test]
    fn test_data_survives_reopen() {
        let (dir, store) = test_store();
        store.append(date(2025, 1, 1), Kind::Income, dec!(42), "persisted").unwrap();
        drop(store);

        let reopened = Store::new(dir.path().join("ledger.db"));
        reopened.ensure_schema().unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_stored_column_encoding() {
        let (_dir, store) = test_store();
        store.append(date(2025, 7, 4), Kind::Expense, dec!(1250), "rent").unwrap();

        let conn = establish_connection(store.path()).unwrap();
        let (date_text, kind_text, amount): (String, String, f64) = conn
            .query_row("SELECT date, type, amount FROM transactions", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!(date_text, "2025-07-04");
        assert_eq!(kind_text, "Expense");
        assert_eq!(amount, 1250.0);
    }

    #[test]
    fn test_non_numeric_amount_is_read_as_malformed() {
        let (_dir, store) = test_store();
        store.append(date(2025, 1, 1), Kind::Income, dec!(100), "ok").unwrap();
        let conn = establish_connection(store.path()).unwrap();
        conn.execute(
            "INSERT INTO transactions (date, type, amount, description) VALUES ('2025-01-02', 'Expense', 'abc', 'broken')",
            [],
        )
        .unwrap();
        drop(conn);

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].amount, StoredAmount::Malformed("abc".to_string()));
    }

    #[test]
    fn test_unreadable_date_and_type_keep_other_rows() {
        let (_dir, store) = test_store();
        store.append(date(2025, 11, 10), Kind::Income, dec!(100), "ok").unwrap();
        let conn = establish_connection(store.path()).unwrap();
        conn.execute(
            "INSERT INTO transactions (date, type, amount, description) VALUES ('2025-11-10 09:30:00', 'Expense', 5, 'timestamp')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO transactions (date, type, amount, description) VALUES ('2025-11-11', 'Transfer', 7, 'odd type')",
            [],
        )
        .unwrap();
        drop(conn);
        store.append(date(2025, 11, 12), Kind::Expense, dec!(30), "after").unwrap();

        let all = store.read_all().unwrap();
        let descriptions: Vec<&str> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["ok", "timestamp", "odd type", "after"]);

        assert_eq!(all[1].date, Stored::Malformed("2025-11-10 09:30:00".to_string()));
        assert_eq!(all[1].kind, Stored::Valid(Kind::Expense));
        assert_eq!(all[2].date, Stored::Valid(date(2025, 11, 11)));
        assert_eq!(all[2].kind, Stored::Malformed("Transfer".to_string()));
        assert_eq!(all[3].date, Stored::Valid(date(2025, 11, 12)));
    }

    #[test]
    fn test_blob_and_null_cells_are_malformed() {
        let (_dir, store) = test_store();
        let conn = establish_connection(store.path()).unwrap();
        conn.execute(
            "INSERT INTO transactions (date, type, amount, description) VALUES (x'0102', NULL, 10, NULL)",
            [],
        )
        .unwrap();
        drop(conn);

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].date, Stored::Malformed("<2 byte blob>".to_string()));
        assert_eq!(all[0].kind, Stored::Malformed(String::new()));
        assert_eq!(all[0].amount, StoredAmount::Valid(dec!(10)));
        assert_eq!(all[0].description, "");
    }

    #[test]
    fn test_largest_exact_amount_round_trips() {
        let (_dir, store) = test_store();
        let largest = Decimal::from(9_007_199_254_740_992_i64);

        store.append(date(2025, 1, 1), Kind::Income, largest, "max").unwrap();

        assert_eq!(store.read_all().unwrap()[0].amount, StoredAmount::Valid(largest));
    }

    fn new_transaction(amount: Decimal, description: &str) -> NewTransaction {
        NewTransaction {
            date: date(2025, 1, 1),
            kind: Kind::Income,
            amount,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_append_all_commits_every_row() {
        let (_dir, store) = test_store();
        let ids = store
            .append_all(&[new_transaction(dec!(1), "a"), new_transaction(dec!(2), "b")])
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids[1] > ids[0]);
        let all = store.read_all().unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_append_all_rolls_back_on_failure() {
        let (_dir, store) = test_store();
        let conn = establish_connection(store.path()).unwrap();
        conn.execute(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON transactions
             WHEN NEW.description = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            [],
        )
        .unwrap();
        drop(conn);

        let result = store.append_all(&[
            new_transaction(dec!(1), "first"),
            new_transaction(dec!(2), "boom"),
            new_transaction(dec!(3), "third"),
        ]);

        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_when_directory_missing() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("nope").join("ledger.db"));

        assert!(matches!(store.ensure_schema(), Err(StoreError::Unavailable { .. })));
        assert!(matches!(
            store.append(date(2025, 1, 1), Kind::Income, dec!(1), ""),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(store.read_all(), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_read_all_without_schema_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("ledger.db"));
        assert!(matches!(store.read_all(), Err(StoreError::Unavailable { .. })));
    }
}
