//! Simulated process behaviour
//!
//! An agent repeatedly asks the coordinator for a random slice of its
//! remaining claim, thinks for a while after each grant, and finishes once
//! its claim is satisfied. Being aborted is terminal.

use std::time::Duration;

use dlsim_coordinator::Coordinator;
use dlsim_errors::{AllocationError, Error};
use dlsim_events::{AppEvent, EventEmitter, EventMeta, EventSender, ProcessEvent};
use dlsim_types::{ProcessId, ProcessState, RequestOutcome, ResourceVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Request sizing and pacing shared by every agent of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    /// Upper bound on any single component of one request
    pub max_per_step: u32,
    pub think_min: Duration,
    pub think_max: Duration,
}

/// One simulated process driving its own request loop
#[derive(Debug)]
pub struct ProcessAgent {
    id: ProcessId,
    max_demand: ResourceVector,
    coordinator: Coordinator,
    rng: StdRng,
    settings: AgentSettings,
    tx: EventSender,
}

impl ProcessAgent {
    #[must_use]
    pub fn new(
        id: ProcessId,
        max_demand: ResourceVector,
        coordinator: Coordinator,
        seed: u64,
        settings: AgentSettings,
        tx: EventSender,
    ) -> Self {
        Self {
            id,
            max_demand,
            coordinator,
            rng: StdRng::seed_from_u64(seed),
            settings,
            tx,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Drive the process to a terminal state
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator rejects a request or its ledger
    /// stops balancing.
    pub async fn run(mut self) -> Result<ProcessState, Error> {
        self.emit(AppEvent::Process(ProcessEvent::Started {
            process: self.id,
            max_demand: self.max_demand.clone(),
        }));

        loop {
            let (state, need) = self.coordinator.observe(self.id)?;
            match state {
                ProcessState::Aborted => return Ok(self.exit()),
                ProcessState::Finished => return Ok(state),
                ProcessState::Running | ProcessState::Waiting => {}
            }

            if need.is_zero() {
                match self.coordinator.finish(self.id) {
                    Ok(_) => return Ok(ProcessState::Finished),
                    // Aborted between observe and finish; observe again.
                    Err(Error::Allocation(AllocationError::NotRunning { .. })) => continue,
                    Err(e) => return Err(e),
                }
            }

            let request = draw_request(&mut self.rng, &need, self.settings.max_per_step);
            tracing::trace!(process = %self.id, %request, %need, "requesting");

            match self.coordinator.request(self.id, request).await {
                Ok(RequestOutcome::Granted) => {
                    let pause = self.think_time();
                    tokio::time::sleep(pause).await;
                }
                Ok(RequestOutcome::Aborted) => return Ok(self.exit()),
                Err(Error::Allocation(AllocationError::NotRunning { .. })) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn exit(&self) -> ProcessState {
        self.emit(AppEvent::Process(ProcessEvent::Exiting { process: self.id }));
        ProcessState::Aborted
    }

    fn think_time(&mut self) -> Duration {
        let lo = millis(self.settings.think_min);
        let hi = millis(self.settings.think_max).max(lo);
        Duration::from_millis(self.rng.random_range(lo..=hi))
    }
}

impl EventEmitter for ProcessAgent {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.correlation_id = Some(format!("proc-{}", self.id));
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Draw a request bounded by `need` and `max_per_step`
///
/// Each component is uniform in `0..=min(need[k], max_per_step)`. If every
/// draw comes out zero while some need remains, one component with positive
/// need is set to 1 so the request always makes progress.
pub fn draw_request(rng: &mut StdRng, need: &ResourceVector, max_per_step: u32) -> ResourceVector {
    let mut request: Vec<u32> = need
        .iter()
        .map(|n| rng.random_range(0..=n.min(max_per_step)))
        .collect();

    if request.iter().all(|&c| c == 0) {
        let positive: Vec<usize> = need
            .iter()
            .enumerate()
            .filter(|&(_, n)| n > 0)
            .map(|(k, _)| k)
            .collect();
        if !positive.is_empty() {
            let k = positive[rng.random_range(0..positive.len())];
            request[k] = 1;
        }
    }
    ResourceVector::from(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_within_need_and_step() {
        let mut rng = StdRng::seed_from_u64(7);
        let need = ResourceVector::from([5, 1, 0]);
        for _ in 0..200 {
            let request = draw_request(&mut rng, &need, 2);
            assert!(request.fits_within(&need));
            assert!(request.iter().all(|c| c <= 2));
            assert!(!request.is_zero());
            assert_eq!(request[2], 0);
        }
    }

    #[test]
    fn test_single_positive_component_forced() {
        let mut rng = StdRng::seed_from_u64(1);
        let need = ResourceVector::from([0, 1, 0]);
        for _ in 0..50 {
            // Either draw 1 directly or get forced to 1.
            assert_eq!(draw_request(&mut rng, &need, 3), ResourceVector::from([0, 1, 0]));
        }
    }

    #[test]
    fn test_zero_need_gives_zero_request() {
        let mut rng = StdRng::seed_from_u64(3);
        let request = draw_request(&mut rng, &ResourceVector::zeros(2), 2);
        assert!(request.is_zero());
    }

    #[test]
    fn test_same_seed_same_draws() {
        let need = ResourceVector::from([3, 3, 2]);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(draw_request(&mut a, &need, 2), draw_request(&mut b, &need, 2));
        }
    }
}
