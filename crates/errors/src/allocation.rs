//! Resource allocation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Failures raised at the request/commit boundary of the coordinator.
///
/// Vectors are carried pre-rendered (`[1, 0, 2]`) so this crate stays free
/// of the simulation types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AllocationError {
    /// A commit would drive `available` below zero. Only a coordinator
    /// defect can produce this.
    #[error(
        "insufficient resources for proc {process}: resource {resource} has {available} available, {requested} requested"
    )]
    InsufficientResources {
        process: usize,
        resource: usize,
        available: u32,
        requested: u32,
    },

    #[error(
        "proc {process} released {released} units of resource {resource} but holds only {held}"
    )]
    ReleaseExceedsAllocation {
        process: usize,
        resource: usize,
        held: u32,
        released: u32,
    },

    #[error("proc {process} request {requested} exceeds declared maximum {maximum} (allocated {allocated})")]
    ExceedsDeclaredMaximum {
        process: usize,
        requested: String,
        allocated: String,
        maximum: String,
    },

    #[error("proc {process} request {requested} can never be satisfied: total is {total} (allocated {allocated})")]
    ExceedsCapacity {
        process: usize,
        requested: String,
        allocated: String,
        total: String,
    },

    /// Counters no longer add up; the ledger cannot be trusted.
    #[error("ledger corrupted: {message}")]
    LedgerCorrupted { message: String },

    #[error("unknown process: {process}")]
    UnknownProcess { process: usize },

    #[error("proc {process} cannot issue requests while {state}")]
    NotRunning { process: usize, state: String },

    #[error("vector has {actual} components, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl AllocationError {
    /// Whether this error indicates a broken coordinator invariant rather
    /// than a bad request.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::InsufficientResources { .. }
                | Self::ReleaseExceedsAllocation { .. }
                | Self::LedgerCorrupted { .. }
        )
    }
}

impl UserFacingError for AllocationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExceedsDeclaredMaximum { .. } => {
                Some("Requests in avoidance mode must stay within the declared maximum demand.")
            }
            Self::ExceedsCapacity { .. } => {
                Some("Reduce the request or raise the resource totals.")
            }
            Self::InsufficientResources { .. }
            | Self::ReleaseExceedsAllocation { .. }
            | Self::LedgerCorrupted { .. } => {
                Some("This indicates a ledger defect; please report it with the seed used.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InsufficientResources { .. } => "allocation.insufficient_resources",
            Self::ReleaseExceedsAllocation { .. } => "allocation.release_exceeds_allocation",
            Self::ExceedsDeclaredMaximum { .. } => "allocation.exceeds_declared_maximum",
            Self::ExceedsCapacity { .. } => "allocation.exceeds_capacity",
            Self::LedgerCorrupted { .. } => "allocation.ledger_corrupted",
            Self::UnknownProcess { .. } => "allocation.unknown_process",
            Self::NotRunning { .. } => "allocation.not_running",
            Self::DimensionMismatch { .. } => "allocation.dimension_mismatch",
        };
        Some(code)
    }
}
