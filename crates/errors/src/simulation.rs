//! Simulation runtime error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationError {
    /// The ledger no longer balances. Fatal for the run.
    #[error("invariant violated: {message}")]
    InvariantViolated { message: String },

    #[error("agent for proc {process} failed: {message}")]
    AgentFailed { process: usize, message: String },

    #[error("detector task failed: {message}")]
    DetectorFailed { message: String },

    #[error("coordinator dropped while proc {process} was waiting")]
    CoordinatorGone { process: usize },
}
