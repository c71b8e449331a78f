#![deny(clippy::pedantic, unsafe_code)]

//! Resource accounting for dlsim
//!
//! This crate provides the resource ledger that every allocation decision
//! is committed against, and the Banker's algorithm safety check used by
//! the avoidance policy.

pub mod ledger;
pub mod safety;

pub use ledger::{ConservationViolation, Delta, LedgerSnapshot, ResourceLedger};
pub use safety::{is_safe, safe_sequence};
