use crate::db::repository::Store;
use crate::error::{AmountError, StoreError};
use crate::models::transaction::{Kind, NewTransaction};
use crate::operations::ledger::parse_amount;
use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parse error on line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("invalid number of columns on line {line}: expected 3, got {found}")]
    ColumnCount { line: usize, found: usize },
    #[error("line {line}: unknown transaction type '{kind}'")]
    UnknownKind { line: usize, kind: String },
    #[error("line {line}: {source}")]
    Amount {
        line: usize,
        #[source]
        source: AmountError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Append every row of a header-less `type,amount,description` CSV file,
/// dated `today`. Rows are all validated first and then written in a single
/// SQLite transaction, so a bad line or a failed write imports nothing.
pub fn import_transactions(store: &Store, path: &Path, today: NaiveDate) -> Result<usize, ImportError> {
    let rows = read_csv(path, today)?;
    store.append_all(&rows)?;

    info!(count = rows.len(), file = %path.display(), "transactions imported");
    Ok(rows.len())
}

fn read_csv(path: &Path, today: NaiveDate) -> Result<Vec<NewTransaction>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let line = index + 1;
        let record = result.map_err(|source| ImportError::Csv { line, source })?;

        if record.len() != 3 {
            return Err(ImportError::ColumnCount {
                line,
                found: record.len(),
            });
        }

        let kind_text = record.get(0).unwrap_or("");
        let kind = kind_text.parse::<Kind>().map_err(|kind| ImportError::UnknownKind { line, kind })?;
        let amount = parse_amount(record.get(1).unwrap_or(""))
            .map_err(|source| ImportError::Amount { line, source })?;
        let description = record.get(2).unwrap_or("").to_string();

        rows.push(NewTransaction {
            date: today,
            kind,
            amount,
            description,
        });
    }

    Ok(rows)
}
