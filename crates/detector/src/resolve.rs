//! Victim selection and recovery

use dlsim_coordinator::Coordinator;
use dlsim_errors::Error;
use dlsim_events::{AbortReason, AppEvent, DetectionEvent, EventEmitter};
use dlsim_types::{ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};

use crate::cycle::find_cycle;
use crate::graph::WaitForGraph;

/// Outcome of breaking one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub cycle: Vec<ProcessId>,
    pub victim: ProcessId,
    /// Units the victim held, now back in `available`
    pub released: ResourceVector,
}

/// Cycle member holding the most units in total; ties go to the lowest id
#[must_use]
pub fn select_victim(cycle: &[ProcessId], allocation: &[ResourceVector]) -> Option<ProcessId> {
    cycle
        .iter()
        .copied()
        .map(|p| {
            let held = allocation.get(p.index()).map_or(0, ResourceVector::sum);
            (p, held)
        })
        // Lower id ranks higher on equal totals.
        .max_by(|(a, held_a), (b, held_b)| held_a.cmp(held_b).then_with(|| b.cmp(a)))
        .map(|(p, _)| p)
}

/// Aborts cycle victims through the coordinator
#[derive(Debug, Clone)]
pub struct Resolver {
    coordinator: Coordinator,
}

impl Resolver {
    #[must_use]
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    /// Break a known cycle by aborting its victim
    ///
    /// The victim is chosen among the members still live at the moment of
    /// the abort. Returns `None`, and reports nothing, if every member has
    /// already terminated.
    ///
    /// # Errors
    ///
    /// Fails only if the coordinator state is unusable.
    pub fn resolve_cycle(&self, cycle: Vec<ProcessId>) -> Result<Option<Resolution>, Error> {
        let coordinator = &self.coordinator;
        let aborted = coordinator.abort_where(AbortReason::Victim, |snapshot| {
            let live: Vec<ProcessId> = cycle
                .iter()
                .copied()
                .filter(|p| snapshot.states.get(p.index()).is_some_and(|s| !s.is_terminal()))
                .collect();
            let victim = select_victim(&live, &snapshot.ledger.allocation)?;
            coordinator.emit(AppEvent::Detection(DetectionEvent::CycleDetected {
                cycle: cycle.clone(),
                victim,
            }));
            Some((victim, cycle))
        })?;

        Ok(aborted.map(|(victim, cycle, released)| Resolution {
            cycle,
            victim,
            released,
        }))
    }

    /// Search the current state for a cycle and break it
    ///
    /// Snapshot, search and abort happen in one critical section, so the
    /// cycle is still present when the victim is aborted.
    ///
    /// # Errors
    ///
    /// Fails only if the coordinator state is unusable.
    pub fn detect_and_resolve(&self) -> Result<Option<Resolution>, Error> {
        let coordinator = &self.coordinator;
        let aborted = coordinator.abort_where(AbortReason::Victim, |snapshot| {
            let graph = WaitForGraph::from_snapshot(snapshot);
            coordinator.emit(AppEvent::Detection(DetectionEvent::ScanCompleted {
                waiting: snapshot.waiting().len(),
                edges: graph.edge_count(),
            }));

            let cycle = find_cycle(&graph)?;
            let victim = select_victim(&cycle, &snapshot.ledger.allocation)?;
            coordinator.emit(AppEvent::Detection(DetectionEvent::CycleDetected {
                cycle: cycle.clone(),
                victim,
            }));
            Some((victim, cycle))
        })?;

        Ok(aborted.map(|(victim, cycle, released)| Resolution {
            cycle,
            victim,
            released,
        }))
    }
}
