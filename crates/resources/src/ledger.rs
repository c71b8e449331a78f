//! Resource ledger
//!
//! The ledger tracks total and available units per resource type together
//! with the per-process allocation matrix. Every change goes through
//! [`ResourceLedger::commit`], which checks the whole delta before touching
//! anything, so the conservation invariant
//! `available[r] + Σ allocation[p][r] == total[r]` holds at every
//! observable point.

use dlsim_errors::AllocationError;
use dlsim_types::{ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};

/// Signed change applied to one process's allocation
#[derive(Debug, Clone, Copy)]
pub enum Delta<'a> {
    /// Move units from `available` into the process's allocation
    Acquire(&'a ResourceVector),
    /// Move units from the process's allocation back into `available`
    Release(&'a ResourceVector),
}

/// Total/available counts and per-process allocations
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    total: ResourceVector,
    available: ResourceVector,
    allocation: Vec<ResourceVector>,
}

impl ResourceLedger {
    /// Create a ledger with every unit available and nothing allocated
    #[must_use]
    pub fn new(total: ResourceVector, processes: usize) -> Self {
        let width = total.len();
        Self {
            available: total.clone(),
            total,
            allocation: vec![ResourceVector::zeros(width); processes],
        }
    }

    /// Number of resource types
    #[must_use]
    pub fn width(&self) -> usize {
        self.total.len()
    }

    /// Number of processes tracked
    #[must_use]
    pub fn processes(&self) -> usize {
        self.allocation.len()
    }

    #[must_use]
    pub fn total(&self) -> &ResourceVector {
        &self.total
    }

    #[must_use]
    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    /// Current allocation of `process`
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if the id is out of range.
    pub fn allocation(&self, process: ProcessId) -> Result<&ResourceVector, AllocationError> {
        self.allocation
            .get(process.index())
            .ok_or(AllocationError::UnknownProcess {
                process: process.index(),
            })
    }

    /// Apply `delta` to `process` atomically
    ///
    /// Either the whole delta is applied or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientResources` if an acquire would drive `available`
    /// negative, `ReleaseExceedsAllocation` if a release is larger than what
    /// the process holds, and `UnknownProcess` / `DimensionMismatch` for
    /// malformed input.
    pub fn commit(&mut self, process: ProcessId, delta: Delta<'_>) -> Result<(), AllocationError> {
        let width = self.width();
        let held = self.allocation(process)?;

        let (next_available, next_held) = match delta {
            Delta::Acquire(units) => {
                units.ensure_len(width)?;
                let available = self.available.checked_sub(units).ok_or_else(|| {
                    let resource = units.first_excess(&self.available).unwrap_or_default();
                    AllocationError::InsufficientResources {
                        process: process.index(),
                        resource,
                        available: self.available[resource],
                        requested: units[resource],
                    }
                })?;
                let held = held
                    .checked_add(units)
                    .ok_or_else(|| overflow(process))?;
                (available, held)
            }
            Delta::Release(units) => {
                units.ensure_len(width)?;
                let remaining = held.checked_sub(units).ok_or_else(|| {
                    let resource = units.first_excess(held).unwrap_or_default();
                    AllocationError::ReleaseExceedsAllocation {
                        process: process.index(),
                        resource,
                        held: held[resource],
                        released: units[resource],
                    }
                })?;
                let available = self
                    .available
                    .checked_add(units)
                    .ok_or_else(|| overflow(process))?;
                (available, remaining)
            }
        };

        self.available = next_available;
        self.allocation[process.index()] = next_held;
        debug_assert!(self.check_conservation().is_ok());
        Ok(())
    }

    /// Release everything `process` holds and return what was released
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if the id is out of range.
    pub fn release_all(&mut self, process: ProcessId) -> Result<ResourceVector, AllocationError> {
        let held = self.allocation(process)?.clone();
        self.commit(process, Delta::Release(&held))?;
        Ok(held)
    }

    /// Immutable copy of the ledger for safety checks and graph building
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total: self.total.clone(),
            available: self.available.clone(),
            allocation: self.allocation.clone(),
        }
    }

    /// Verify `available[r] + Σ allocation[p][r] == total[r]` for every r
    ///
    /// # Errors
    ///
    /// Returns a [`ConservationViolation`] describing the first resource type
    /// that does not balance.
    pub fn check_conservation(&self) -> Result<(), ConservationViolation> {
        check_conservation(&self.total, &self.available, &self.allocation)
    }
}

fn overflow(process: ProcessId) -> AllocationError {
    AllocationError::LedgerCorrupted {
        message: format!("counter overflow while committing for proc {process}"),
    }
}

/// Point-in-time copy of a [`ResourceLedger`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total: ResourceVector,
    pub available: ResourceVector,
    pub allocation: Vec<ResourceVector>,
}

impl LedgerSnapshot {
    /// # Errors
    ///
    /// See [`ResourceLedger::check_conservation`].
    pub fn check_conservation(&self) -> Result<(), ConservationViolation> {
        check_conservation(&self.total, &self.available, &self.allocation)
    }
}

/// A resource type whose books do not balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConservationViolation {
    pub resource: usize,
    pub total: u64,
    pub accounted: u64,
}

impl std::fmt::Display for ConservationViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "resource {} accounts for {} units but total is {}",
            self.resource, self.accounted, self.total
        )
    }
}

fn check_conservation(
    total: &ResourceVector,
    available: &ResourceVector,
    allocation: &[ResourceVector],
) -> Result<(), ConservationViolation> {
    for resource in 0..total.len() {
        let held: u64 = allocation
            .iter()
            .map(|row| u64::from(row.as_slice().get(resource).copied().unwrap_or(0)))
            .sum();
        let accounted = u64::from(available.as_slice().get(resource).copied().unwrap_or(0)) + held;
        if accounted != u64::from(total[resource]) {
            return Err(ConservationViolation {
                resource,
                total: u64::from(total[resource]),
                accounted,
            });
        }
    }
    Ok(())
}
