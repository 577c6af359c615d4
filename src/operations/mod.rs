pub mod add;
pub mod dashboard;
pub mod import;
pub mod ledger;
