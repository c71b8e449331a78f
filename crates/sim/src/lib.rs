#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Simulation runtime for dlsim
//!
//! Generates a seeded scenario, runs one agent task per process against a
//! shared coordinator and, in detection mode, a deadlock detector alongside
//! them. Runs are reproducible on a paused clock.

pub mod agent;
pub mod scenario;
pub mod simulation;

pub use agent::{draw_request, AgentSettings, ProcessAgent};
pub use scenario::Scenario;
pub use simulation::{Simulation, SimulationOptions};
