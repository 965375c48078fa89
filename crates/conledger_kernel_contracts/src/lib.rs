#![forbid(unsafe_code)]

pub mod access;
pub mod batch;
pub mod common;
pub mod decryption;
pub mod events;
pub mod fhe;

pub use common::{ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, Validate};
