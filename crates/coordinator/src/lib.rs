#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Allocation coordinator for dlsim
//!
//! The [`Coordinator`] owns the resource ledger and process table behind a
//! single lock. Process agents call [`Coordinator::request`] and either get
//! an immediate grant or suspend on a one-shot wake channel until a release
//! lets the active [`GrantPolicy`] admit them, or until they are aborted.

mod coordinator;
pub mod policy;
pub mod state;

pub use coordinator::Coordinator;
pub use policy::{BankersPolicy, GrantPolicy, GreedyPolicy};
pub use state::{ProcessRecord, SystemSnapshot, SystemState};
