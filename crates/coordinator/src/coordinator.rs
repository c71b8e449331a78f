//! Coordinator handle
//!
//! The only gateway to the ledger. Each operation takes the state lock,
//! applies one transition and releases the lock before any await, so
//! commits, safety checks and reevaluation passes never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use dlsim_errors::{ConfigError, Error, SimulationError};
use dlsim_events::{AbortReason, EventEmitter, EventSender};
use dlsim_types::{Mode, ProcessId, ProcessState, RequestOutcome, ResourceVector};

use crate::state::{Submission, SystemSnapshot, SystemState};

/// Cloneable handle to the shared simulation state
#[derive(Debug, Clone)]
pub struct Coordinator {
    inner: Arc<Mutex<SystemState>>,
    mode: Mode,
    tx: EventSender,
}

impl Coordinator {
    /// Create a coordinator with every unit available
    ///
    /// # Errors
    ///
    /// Returns a config error if a max-demand row has the wrong length or
    /// asks for more than exists.
    pub fn new(
        mode: Mode,
        total: ResourceVector,
        max_demands: Vec<ResourceVector>,
        tx: EventSender,
    ) -> Result<Self, Error> {
        for (i, row) in max_demands.iter().enumerate() {
            row.ensure_len(total.len())?;
            if !row.fits_within(&total) {
                return Err(ConfigError::Invalid {
                    message: format!("max demand {row} of proc {i} exceeds total {total}"),
                }
                .into());
            }
        }

        let state = SystemState::new(mode, total, max_demands, tx.clone());
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            mode,
            tx,
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn lock(&self) -> Result<MutexGuard<'_, SystemState>, Error> {
        self.inner
            .lock()
            .map_err(|_| Error::internal("coordinator state lock poisoned"))
    }

    /// Ask for `request` more units on behalf of `process`
    ///
    /// Returns once the request is granted or the process is aborted while
    /// waiting. `Aborted` is terminal.
    ///
    /// # Errors
    ///
    /// Returns an allocation error for malformed or policy-violating
    /// requests (these are rejected, never queued), and an invariant error
    /// if the ledger stops balancing.
    pub async fn request(
        &self,
        process: ProcessId,
        request: ResourceVector,
    ) -> Result<RequestOutcome, Error> {
        let submission = self.lock()?.submit(process, request)?;
        let wake = match submission {
            Submission::Granted => return Ok(RequestOutcome::Granted),
            Submission::Waiting(rx) => rx,
        };

        wake.await.map_err(|_| {
            SimulationError::CoordinatorGone {
                process: process.index(),
            }
            .into()
        })
    }

    /// Return part of an allocation
    ///
    /// # Errors
    ///
    /// Returns `ReleaseExceedsAllocation` if `units` is more than held, or
    /// `NotRunning` if the process is not running.
    pub fn release(&self, process: ProcessId, units: &ResourceVector) -> Result<(), Error> {
        self.lock()?.release(process, units)
    }

    /// Release everything `process` holds and mark it finished
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if the process is waiting or already terminal.
    pub fn finish(&self, process: ProcessId) -> Result<ResourceVector, Error> {
        self.lock()?.finish(process)
    }

    /// Abort `process`, reclaiming its allocation and failing its pending request
    ///
    /// Returns what was released, or `None` if the process was already
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` for a bad id.
    pub fn abort(
        &self,
        process: ProcessId,
        reason: AbortReason,
    ) -> Result<Option<ResourceVector>, Error> {
        self.lock()?.abort(process, reason)
    }

    /// Pick a process from a consistent snapshot and abort it, atomically
    ///
    /// `select` runs under the state lock, so nothing can change between
    /// the decision and the abort. It returns the process to abort plus any
    /// value the caller wants back. Returns `None` if nothing was selected
    /// or the selected process was already terminal.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if `select` names a bad id.
    pub fn abort_where<T>(
        &self,
        reason: AbortReason,
        select: impl FnOnce(&SystemSnapshot) -> Option<(ProcessId, T)>,
    ) -> Result<Option<(ProcessId, T, ResourceVector)>, Error> {
        let mut state = self.lock()?;
        let snapshot = state.snapshot();
        let Some((process, value)) = select(&snapshot) else {
            return Ok(None);
        };
        Ok(state
            .abort(process, reason)?
            .map(|released| (process, value, released)))
    }

    /// Remaining claim of `process`
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` for a bad id.
    pub fn need(&self, process: ProcessId) -> Result<ResourceVector, Error> {
        Ok(self.lock()?.need(process)?)
    }

    /// # Errors
    ///
    /// Returns `UnknownProcess` for a bad id.
    pub fn process_state(&self, process: ProcessId) -> Result<ProcessState, Error> {
        Ok(self.lock()?.record(process)?.state)
    }

    /// Read `need` and state in one critical section
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` for a bad id.
    pub fn observe(&self, process: ProcessId) -> Result<(ProcessState, ResourceVector), Error> {
        let state = self.lock()?;
        Ok((state.record(process)?.state, state.need(process)?))
    }

    /// # Errors
    ///
    /// Fails only if the state lock is poisoned.
    pub fn snapshot(&self) -> Result<SystemSnapshot, Error> {
        Ok(self.lock()?.snapshot())
    }

    /// # Errors
    ///
    /// Fails only if the state lock is poisoned.
    pub fn all_terminal(&self) -> Result<bool, Error> {
        Ok(self.lock()?.all_terminal())
    }

    /// # Errors
    ///
    /// Fails only if the state lock is poisoned.
    pub fn waiting_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.waiting_count())
    }
}

impl EventEmitter for Coordinator {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}
