use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::path::Path;

/// Database file used when no path is configured. Lives next to wherever the
/// application is started from.
pub const DEFAULT_DB_FILE: &str = "finance_tracker.db";

/// Column layout shared with data written by earlier versions of the app.
/// Do not change it: there is no migration step.
pub const CREATE_TRANSACTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT,
    type TEXT,
    amount REAL,
    description TEXT
)";

/// Open a fresh connection to the database at `path`. Callers hold it for a
/// single operation and let it drop, which closes the handle.
pub fn establish_connection(path: &Path) -> StoreResult<Connection> {
    Connection::open(path).map_err(|source| unavailable(path, source))
}

pub(crate) fn unavailable(path: &Path, source: rusqlite::Error) -> StoreError {
    StoreError::Unavailable {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_establish_connection_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let conn = establish_connection(&path).unwrap();
        conn.execute(CREATE_TRANSACTIONS_TABLE, []).unwrap();
        drop(conn);

        assert!(path.exists());
    }

    #[test]
    fn test_establish_connection_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("ledger.db");

        let result = establish_connection(&path);
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }
}
