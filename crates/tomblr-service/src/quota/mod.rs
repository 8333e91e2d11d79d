//! Per-user storage accounting.

pub mod ledger;

pub use ledger::QuotaLedger;
