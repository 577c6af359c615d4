use crate::db::connection::DEFAULT_DB_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "finance_tracker.log";

/// Record income and expenses and keep a running balance.
#[derive(Debug, Parser)]
#[command(name = "fintrack", version)]
pub struct Cli {
    /// SQLite file holding the transactions.
    #[arg(long, env = "FINTRACK_DB", default_value = DEFAULT_DB_FILE, global = true)]
    pub db: PathBuf,

    /// Write logs to this file. The dashboard defaults to finance_tracker.log,
    /// other commands log to stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive dashboard (the default).
    Dashboard,
    /// Record one transaction dated today.
    Add {
        /// income or expense
        kind: String,
        /// Whole amount; '.' and ',' are thousands separators.
        amount: String,
        /// Free-text label.
        description: Vec<String>,
    },
    /// Print every transaction in the order it was recorded.
    List,
    /// Print the current balance.
    Balance,
    /// Import a header-less CSV of type,amount,description rows.
    Import { file: PathBuf },
}
