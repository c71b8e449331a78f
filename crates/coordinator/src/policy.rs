//! Grant policies
//!
//! A policy decides two things about a request: whether it is acceptable at
//! all ([`GrantPolicy::validate`]) and whether it can be granted right now
//! ([`GrantPolicy::admits`]). Requests that validate but are not admitted
//! wait in the coordinator queue.

use dlsim_errors::AllocationError;
use dlsim_resources::is_safe;
use dlsim_types::{Mode, ProcessId, ResourceVector};

use crate::state::SystemState;

pub trait GrantPolicy: Send + Sync {
    fn mode(&self) -> Mode;

    /// Reject requests that can never be granted
    ///
    /// # Errors
    ///
    /// Returns the policy-specific bound the request breaks.
    fn validate(
        &self,
        state: &SystemState,
        process: ProcessId,
        request: &ResourceVector,
    ) -> Result<(), AllocationError>;

    /// Whether granting `request` now is allowed
    fn admits(&self, state: &SystemState, process: ProcessId, request: &ResourceVector) -> bool;
}

/// Select the policy for a run mode
#[must_use]
pub fn for_mode(mode: Mode) -> Box<dyn GrantPolicy> {
    match mode {
        Mode::Avoidance => Box::new(BankersPolicy),
        Mode::Detection => Box::new(GreedyPolicy),
    }
}

/// Banker's algorithm: grant only into safe states
#[derive(Debug, Clone, Copy, Default)]
pub struct BankersPolicy;

impl GrantPolicy for BankersPolicy {
    fn mode(&self) -> Mode {
        Mode::Avoidance
    }

    fn validate(
        &self,
        state: &SystemState,
        process: ProcessId,
        request: &ResourceVector,
    ) -> Result<(), AllocationError> {
        let maximum = &state.record(process)?.max_demand;
        let allocated = state.ledger().allocation(process)?;
        let claimed = allocated.checked_add(request);
        if claimed.as_ref().is_some_and(|c| c.fits_within(maximum)) {
            Ok(())
        } else {
            Err(AllocationError::ExceedsDeclaredMaximum {
                process: process.index(),
                requested: request.to_string(),
                allocated: allocated.to_string(),
                maximum: maximum.to_string(),
            })
        }
    }

    fn admits(&self, state: &SystemState, process: ProcessId, request: &ResourceVector) -> bool {
        let ledger = state.ledger();
        let Some(available) = ledger.available().checked_sub(request) else {
            return false;
        };

        // Hypothetical state with the grant applied, restricted to the
        // processes that can still ask for anything.
        let mut allocation = Vec::new();
        let mut need = Vec::new();
        for (i, record) in state.records().iter().enumerate() {
            if record.state.is_terminal() {
                continue;
            }
            let id = ProcessId(i);
            let Ok(held) = ledger.allocation(id) else {
                return false;
            };
            let held = if id == process {
                match held.checked_add(request) {
                    Some(h) => h,
                    None => return false,
                }
            } else {
                held.clone()
            };
            need.push(record.max_demand.saturating_sub(&held));
            allocation.push(held);
        }

        is_safe(&available, &allocation, &need)
    }
}

/// Grant whenever the units are physically available
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl GrantPolicy for GreedyPolicy {
    fn mode(&self) -> Mode {
        Mode::Detection
    }

    fn validate(
        &self,
        state: &SystemState,
        process: ProcessId,
        request: &ResourceVector,
    ) -> Result<(), AllocationError> {
        let total = state.ledger().total();
        let allocated = state.ledger().allocation(process)?;
        let claimed = allocated.checked_add(request);
        if claimed.as_ref().is_some_and(|c| c.fits_within(total)) {
            Ok(())
        } else {
            Err(AllocationError::ExceedsCapacity {
                process: process.index(),
                requested: request.to_string(),
                allocated: allocated.to_string(),
                total: total.to_string(),
            })
        }
    }

    fn admits(&self, state: &SystemState, _process: ProcessId, request: &ResourceVector) -> bool {
        request.fits_within(state.ledger().available())
    }
}
