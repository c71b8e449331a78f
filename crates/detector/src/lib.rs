#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock detection and recovery for dlsim
//!
//! Detection mode grants greedily, so circular waits can form. This crate
//! derives a wait-for graph from a coordinator snapshot, finds a cycle with
//! a depth-first search, picks a victim and aborts it through the
//! coordinator. [`DeadlockDetector`] repeats that on a fixed poll interval
//! until every process has finished or been aborted.

pub mod cycle;
pub mod graph;
pub mod monitor;
pub mod resolve;

pub use cycle::{find_cycle, has_cycle};
pub use graph::WaitForGraph;
pub use monitor::{DeadlockDetector, DetectorReport};
pub use resolve::{select_victim, Resolution, Resolver};
