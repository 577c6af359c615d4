use std::path::PathBuf;
use thiserror::Error;

/// Raised when user-typed amount text cannot be turned into a whole amount.
/// Recoverable: the caller re-prompts and nothing has been written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount '{0}', expected digits with optional '.' or ',' grouping")]
    NotANumber(String),
    #[error("amount '{0}' is too large")]
    OutOfRange(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable at {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
