//! Report type definitions for simulation runs

use crate::{Mode, ProcessId, ProcessState, ResourceVector};
use serde::{Deserialize, Serialize};

/// Final summary of one simulation run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Policy the run used
    pub mode: Mode,
    /// Seed the scenario was generated from
    pub seed: u64,
    /// Total units per resource type
    pub total: ResourceVector,
    /// Units available after the run (equals `total` when everything was released)
    pub available: ResourceVector,
    /// One entry per process, ordered by id
    pub processes: Vec<ProcessSummary>,
    /// Cycles reported by the detector, in detection order
    pub cycles: Vec<Vec<ProcessId>>,
    /// Victims aborted by the resolver, in abort order
    pub victims: Vec<ProcessId>,
    /// Processes force-aborted when the run deadline passed
    pub swept: Vec<ProcessId>,
    /// Simulated run time
    pub duration_ms: u64,
}

impl SimulationReport {
    /// Count of processes that ended in `state`
    #[must_use]
    pub fn count(&self, state: ProcessState) -> usize {
        self.processes.iter().filter(|p| p.state == state).count()
    }

    /// True when every process reached a terminal state
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.processes.iter().all(|p| p.state.is_terminal())
    }
}

/// Per-process line of a [`SimulationReport`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub id: ProcessId,
    pub max_demand: ResourceVector,
    pub state: ProcessState,
    /// Requests granted over the run
    pub grants: u32,
    /// Requests that had to wait
    pub waits: u32,
}
