use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Direction of a transaction. The stored amount is never signed; the kind
/// decides whether it adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    /// Literal written to the `type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Income => "Income",
            Kind::Expense => "Expense",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Kind::Income => Kind::Expense,
            Kind::Expense => Kind::Income,
        }
    }

    /// Decode the exact `type` column literal. User input goes through
    /// `FromStr` instead, which is case-insensitive.
    pub fn from_column(value: &str) -> Option<Self> {
        match value {
            "Income" => Some(Kind::Income),
            "Expense" => Some(Kind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(other.to_string()),
        }
    }
}

/// A column value as read back from SQLite. Column types are not enforced,
/// so a row written by another tool may hold text this program cannot
/// decode. The raw text is kept so the row can still be listed.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<T> {
    Valid(T),
    Malformed(String),
}

impl<T> Stored<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Stored::Valid(value) => Some(value),
            Stored::Malformed(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Stored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stored::Valid(value) => value.fmt(f),
            Stored::Malformed(raw) => write!(f, "? ({})", raw),
        }
    }
}

pub type StoredAmount = Stored<Decimal>;

/// A transaction that has passed validation but has no id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub kind: Kind,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub date: Stored<NaiveDate>,
    pub kind: Stored<Kind>,
    pub amount: StoredAmount,
    pub description: String,
}

impl Transaction {
    #[cfg(test)]
    pub fn new(
        id: i64,
        date: NaiveDate,
        kind: Kind,
        amount: Decimal,
        description: String,
    ) -> Self {
        Self {
            id,
            date: Stored::Valid(date),
            kind: Stored::Valid(kind),
            amount: Stored::Valid(amount),
            description,
        }
    }
}
