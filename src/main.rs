mod cli;
mod db;
mod error;
mod models;
mod observability;
mod operations;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Command, DEFAULT_LOG_FILE};
use db::repository::Store;
use models::transaction::Transaction;
use observability::LogTarget;
use operations::add::record_from_input;
use operations::dashboard::run_dashboard;
use operations::import::import_transactions;
use operations::ledger::{compute_balance, display_stored_amount, format_amount};
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Dashboard);

    let log_target = match (cli.log_file, &command) {
        (Some(path), _) => LogTarget::File(path),
        (None, Command::Dashboard) => LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE)),
        (None, _) => LogTarget::Stderr,
    };
    observability::init(&log_target)?;

    let store = Store::new(cli.db);
    store
        .ensure_schema()
        .with_context(|| format!("failed to prepare {}", store.path().display()))?;

    match command {
        Command::Dashboard => run_dashboard(&store)?,
        Command::Add {
            kind,
            amount,
            description,
        } => {
            let today = Local::now().date_naive();
            let id = record_from_input(&store, &kind, &amount, &description.join(" "), today)
                .context("transaction not added")?;
            println!("Transaction #{} added.", id);
            print_balance(&store)?;
        }
        Command::List => {
            let transactions = store.read_all()?;
            if transactions.is_empty() {
                println!("No transactions recorded yet.");
            }
            for transaction in &transactions {
                println!("{}", format_row(transaction));
            }
        }
        Command::Balance => print_balance(&store)?,
        Command::Import { file } => {
            let today = Local::now().date_naive();
            let count = import_transactions(&store, &file, today)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!("Successfully imported {} transactions.", count);
            print_balance(&store)?;
        }
    }

    Ok(())
}

fn print_balance(store: &Store) -> Result<()> {
    let transactions = store.read_all()?;
    println!("Current Balance: {}", format_amount(compute_balance(&transactions)));
    Ok(())
}

fn format_row(transaction: &Transaction) -> String {
    format!(
        "{:>5}  {}  {:<7}  {:>14}  {}",
        transaction.id,
        transaction.date.to_string(),
        transaction.kind.to_string(),
        display_stored_amount(&transaction.amount),
        transaction.description
    )
}
