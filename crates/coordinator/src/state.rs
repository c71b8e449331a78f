//! Shared simulation state and its transitions
//!
//! Everything here runs inside the coordinator's critical section. Methods
//! take `&mut self`, never await, and emit their events before returning so
//! the event stream matches the order in which transitions were applied.

use std::collections::VecDeque;

use dlsim_errors::{AllocationError, Error, SimulationError};
use dlsim_events::{AbortReason, AllocationEvent, AppEvent, EventEmitter, EventSender, ProcessEvent};
use dlsim_resources::{Delta, LedgerSnapshot, ResourceLedger};
use dlsim_types::{Mode, ProcessId, ProcessState, ProcessSummary, RequestOutcome, ResourceVector};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::policy::{self, GrantPolicy};

/// A request that could not be granted yet
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub(crate) request: ResourceVector,
    wake: oneshot::Sender<RequestOutcome>,
}

/// Per-process bookkeeping
#[derive(Debug)]
pub struct ProcessRecord {
    pub max_demand: ResourceVector,
    pub state: ProcessState,
    pub(crate) pending: Option<PendingRequest>,
    pub grants: u32,
    pub waits: u32,
}

/// Result of submitting a request
#[derive(Debug)]
pub(crate) enum Submission {
    Granted,
    Waiting(oneshot::Receiver<RequestOutcome>),
}

/// Ledger, process table and wait queue behind the coordinator lock
pub struct SystemState {
    mode: Mode,
    ledger: ResourceLedger,
    records: Vec<ProcessRecord>,
    /// Waiting processes in arrival order
    queue: VecDeque<ProcessId>,
    policy: Box<dyn GrantPolicy>,
    events: EventSender,
}

impl std::fmt::Debug for SystemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemState")
            .field("mode", &self.mode)
            .field("ledger", &self.ledger)
            .field("records", &self.records)
            .field("queue", &self.queue)
            .field("policy", &self.policy.mode())
            .finish_non_exhaustive()
    }
}

impl SystemState {
    pub(crate) fn new(
        mode: Mode,
        total: ResourceVector,
        max_demands: Vec<ResourceVector>,
        events: EventSender,
    ) -> Self {
        let ledger = ResourceLedger::new(total, max_demands.len());
        let records = max_demands
            .into_iter()
            .map(|max_demand| ProcessRecord {
                max_demand,
                state: ProcessState::Running,
                pending: None,
                grants: 0,
                waits: 0,
            })
            .collect();
        Self {
            mode,
            ledger,
            records,
            queue: VecDeque::new(),
            policy: policy::for_mode(mode),
            events,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    #[must_use]
    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Look up a process record
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if the id is out of range.
    pub fn record(&self, process: ProcessId) -> Result<&ProcessRecord, AllocationError> {
        self.records
            .get(process.index())
            .ok_or(AllocationError::UnknownProcess {
                process: process.index(),
            })
    }

    fn record_mut(&mut self, process: ProcessId) -> Result<&mut ProcessRecord, AllocationError> {
        self.records
            .get_mut(process.index())
            .ok_or(AllocationError::UnknownProcess {
                process: process.index(),
            })
    }

    /// Remaining claim `max_demand - allocation`
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if the id is out of range.
    pub fn need(&self, process: ProcessId) -> Result<ResourceVector, AllocationError> {
        let record = self.record(process)?;
        let held = self.ledger.allocation(process)?;
        Ok(record.max_demand.saturating_sub(held))
    }

    pub(crate) fn all_terminal(&self) -> bool {
        self.records.iter().all(|r| r.state.is_terminal())
    }

    pub(crate) fn waiting_count(&self) -> usize {
        self.queue.len()
    }

    /// Validate and either grant `request` or park it
    pub(crate) fn submit(
        &mut self,
        process: ProcessId,
        request: ResourceVector,
    ) -> Result<Submission, Error> {
        let record = self.record(process)?;
        request.ensure_len(self.ledger.width())?;
        if record.state != ProcessState::Running {
            return Err(AllocationError::NotRunning {
                process: process.index(),
                state: record.state.to_string(),
            }
            .into());
        }
        self.policy.validate(self, process, &request)?;

        if self.policy.admits(self, process, &request) {
            self.grant(process, &request)?;
            return Ok(Submission::Granted);
        }

        let (wake, rx) = oneshot::channel();
        let need = self.need(process)?;
        let available = self.ledger.available().clone();
        let record = self.record_mut(process)?;
        record.state = ProcessState::Waiting;
        record.waits += 1;
        record.pending = Some(PendingRequest {
            request: request.clone(),
            wake,
        });
        self.queue.push_back(process);
        self.events
            .emit_deferred(self.mode, process, request, need, available);
        Ok(Submission::Waiting(rx))
    }

    /// Return part of an allocation, then wake whoever now fits
    pub(crate) fn release(
        &mut self,
        process: ProcessId,
        units: &ResourceVector,
    ) -> Result<(), Error> {
        self.ensure_running(process)?;
        self.ledger.commit(process, Delta::Release(units))?;
        self.events.emit_debug(format!(
            "proc {process} released {units}, avail={}",
            self.ledger.available()
        ));
        self.reevaluate()
    }

    /// Release everything, mark the process finished and wake waiters
    pub(crate) fn finish(&mut self, process: ProcessId) -> Result<ResourceVector, Error> {
        self.ensure_running(process)?;
        let released = self.ledger.release_all(process).map_err(invariant)?;
        self.events.emit(AppEvent::Allocation(AllocationEvent::Released {
            process,
            released: released.clone(),
            available: self.ledger.available().clone(),
        }));
        self.record_mut(process)?.state = ProcessState::Finished;
        self.events
            .emit(AppEvent::Process(ProcessEvent::Finished { process }));
        self.reevaluate()?;
        Ok(released)
    }

    /// Abort a non-terminal process and reclaim its allocation
    ///
    /// A pending request is resolved with [`RequestOutcome::Aborted`].
    /// Aborting a terminal process is a no-op returning `None`.
    pub(crate) fn abort(
        &mut self,
        process: ProcessId,
        reason: AbortReason,
    ) -> Result<Option<ResourceVector>, Error> {
        if self.record(process)?.state.is_terminal() {
            return Ok(None);
        }

        let released = self.ledger.release_all(process).map_err(invariant)?;
        self.queue.retain(|&p| p != process);
        let record = self.record_mut(process)?;
        record.state = ProcessState::Aborted;
        if let Some(pending) = record.pending.take() {
            // The agent may already be gone at shutdown.
            let _ = pending.wake.send(RequestOutcome::Aborted);
        }

        self.events.emit(AppEvent::Process(ProcessEvent::Aborted {
            process,
            reason,
            released: released.clone(),
            available: self.ledger.available().clone(),
        }));
        self.reevaluate()?;
        Ok(Some(released))
    }

    /// Grant pending requests in arrival order until a full pass grants none
    fn reevaluate(&mut self) -> Result<(), Error> {
        loop {
            let mut granted_any = false;
            let queued: Vec<ProcessId> = self.queue.iter().copied().collect();

            for process in queued {
                let Some(request) = self
                    .record(process)?
                    .pending
                    .as_ref()
                    .map(|p| p.request.clone())
                else {
                    continue;
                };
                if !self.policy.admits(self, process, &request) {
                    continue;
                }

                self.queue.retain(|&p| p != process);
                let record = self.record_mut(process)?;
                record.state = ProcessState::Running;
                let pending = record.pending.take();
                self.grant(process, &request)?;
                if let Some(pending) = pending {
                    let _ = pending.wake.send(RequestOutcome::Granted);
                }
                tracing::trace!(%process, %request, "waiter granted");
                granted_any = true;
            }

            if !granted_any {
                break;
            }
        }
        self.verify()
    }

    fn grant(&mut self, process: ProcessId, request: &ResourceVector) -> Result<(), Error> {
        self.ledger
            .commit(process, Delta::Acquire(request))
            .map_err(invariant)?;
        self.record_mut(process)?.grants += 1;
        self.events.emit_granted(
            self.mode,
            process,
            request.clone(),
            self.ledger.allocation(process)?.clone(),
            self.ledger.available().clone(),
        );
        Ok(())
    }

    fn ensure_running(&self, process: ProcessId) -> Result<(), AllocationError> {
        let record = self.record(process)?;
        if record.state == ProcessState::Running {
            Ok(())
        } else {
            Err(AllocationError::NotRunning {
                process: process.index(),
                state: record.state.to_string(),
            })
        }
    }

    fn verify(&self) -> Result<(), Error> {
        self.ledger.check_conservation().map_err(|violation| {
            tracing::error!(%violation, "ledger conservation violated");
            SimulationError::InvariantViolated {
                message: violation.to_string(),
            }
            .into()
        })
    }

    pub(crate) fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            mode: self.mode,
            ledger: self.ledger.snapshot(),
            max_demand: self.records.iter().map(|r| r.max_demand.clone()).collect(),
            states: self.records.iter().map(|r| r.state).collect(),
            requests: self
                .records
                .iter()
                .map(|r| r.pending.as_ref().map(|p| p.request.clone()))
                .collect(),
            grants: self.records.iter().map(|r| r.grants).collect(),
            waits: self.records.iter().map(|r| r.waits).collect(),
        }
    }
}

/// A failed commit on a path the policy already cleared means the books
/// are broken.
fn invariant(err: AllocationError) -> Error {
    SimulationError::InvariantViolated {
        message: err.to_string(),
    }
    .into()
}

/// Consistent copy of the coordinator state taken under the lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub mode: Mode,
    pub ledger: LedgerSnapshot,
    pub max_demand: Vec<ResourceVector>,
    pub states: Vec<ProcessState>,
    /// Outstanding request per process, if it is waiting
    pub requests: Vec<Option<ResourceVector>>,
    pub grants: Vec<u32>,
    pub waits: Vec<u32>,
}

impl SystemSnapshot {
    #[must_use]
    pub fn processes(&self) -> usize {
        self.states.len()
    }

    /// Ids of processes currently waiting, ascending
    #[must_use]
    pub fn waiting(&self) -> Vec<ProcessId> {
        self.ids_where(|s| s == ProcessState::Waiting)
    }

    /// Ids of processes not yet finished or aborted, ascending
    #[must_use]
    pub fn unfinished(&self) -> Vec<ProcessId> {
        self.ids_where(|s| !s.is_terminal())
    }

    fn ids_where(&self, pred: impl Fn(ProcessState) -> bool) -> Vec<ProcessId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| pred(**s))
            .map(|(i, _)| ProcessId(i))
            .collect()
    }

    /// Per-process report lines
    #[must_use]
    pub fn summaries(&self) -> Vec<ProcessSummary> {
        (0..self.processes())
            .map(|i| ProcessSummary {
                id: ProcessId(i),
                max_demand: self.max_demand[i].clone(),
                state: self.states[i],
                grants: self.grants[i],
                waits: self.waits[i],
            })
            .collect()
    }
}
