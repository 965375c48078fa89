#![forbid(unsafe_code)]

pub mod access;
pub mod batch_ledger;
pub mod config;
pub mod decryption;
pub mod error;
pub mod ledger;
mod notify;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::ConfidentialLedger;
