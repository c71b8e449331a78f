//! Run driver
//!
//! Wires a scenario to a coordinator, spawns one task per agent plus the
//! detector in detection mode, enforces the run deadline and assembles the
//! final report.

use std::collections::HashMap;
use std::time::Duration;

use dlsim_config::Config;
use dlsim_coordinator::Coordinator;
use dlsim_detector::{DeadlockDetector, DetectorReport};
use dlsim_errors::{Error, SimulationError};
use dlsim_events::{
    AbortReason, AppEvent, DetectionEvent, EventEmitter, EventMeta, EventSender, FailureContext,
    SimulationEvent,
};
use dlsim_types::{Mode, ProcessId, ProcessState, SimulationReport};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::agent::{AgentSettings, ProcessAgent};
use crate::scenario::Scenario;

/// Timing knobs for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub agent: AgentSettings,
}

impl SimulationOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let (think_min, think_max) = config.timing.think_time();
        Self {
            poll_interval: config.timing.poll_interval(),
            run_timeout: config.timing.run_timeout(),
            agent: AgentSettings {
                max_per_step: config.agent.max_per_step,
                think_min,
                think_max,
            },
        }
    }
}

/// One configured run, ready to start
#[derive(Debug, Clone)]
pub struct Simulation {
    scenario: Scenario,
    options: SimulationOptions,
    tx: EventSender,
}

impl Simulation {
    #[must_use]
    pub fn new(scenario: Scenario, options: SimulationOptions, tx: EventSender) -> Self {
        Self {
            scenario,
            options,
            tx,
        }
    }

    /// Validate `config` and generate its scenario
    ///
    /// # Errors
    ///
    /// Returns a config error if the configuration is invalid.
    pub fn from_config(config: &Config, tx: EventSender) -> Result<Self, Error> {
        config.validate()?;
        let scenario = Scenario::generate(
            config.simulation.mode,
            config.total(),
            config.simulation.processes,
            config.simulation.seed,
        );
        Ok(Self::new(scenario, SimulationOptions::from_config(config), tx))
    }

    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Run to completion
    ///
    /// # Errors
    ///
    /// Returns an error if an agent or the detector fails, or the ledger
    /// stops balancing. A `Failed` event is emitted first.
    pub async fn run(self) -> Result<SimulationReport, Error> {
        let result = self.execute().await;
        if let Err(e) = &result {
            self.emit(AppEvent::Simulation(SimulationEvent::Failed {
                failure: FailureContext::from_error(e),
            }));
        }
        result
    }

    async fn execute(&self) -> Result<SimulationReport, Error> {
        let scenario = &self.scenario;
        let started = Instant::now();

        self.emit(AppEvent::Simulation(SimulationEvent::Started {
            mode: scenario.mode,
            seed: scenario.seed,
            total: scenario.total.clone(),
            max_demand: scenario.max_demand.clone(),
        }));

        let coordinator = Coordinator::new(
            scenario.mode,
            scenario.total.clone(),
            scenario.max_demand.clone(),
            self.tx.clone(),
        )?;

        let detector = (scenario.mode == Mode::Detection).then(|| {
            let detector = DeadlockDetector::new(coordinator.clone(), self.options.poll_interval);
            tokio::spawn(detector.run())
        });

        let detector_abort = detector.as_ref().map(JoinHandle::abort_handle);

        let mut agents = Agents::default();
        for (i, (row, &seed)) in scenario
            .max_demand
            .iter()
            .zip(&scenario.agent_seeds)
            .enumerate()
        {
            let agent = ProcessAgent::new(
                ProcessId(i),
                row.clone(),
                coordinator.clone(),
                seed,
                self.options.agent,
                self.tx.clone(),
            );
            let handle = agents.set.spawn(agent.run());
            agents.ids.insert(handle.id(), ProcessId(i));
        }

        let outcome = self.drive(&coordinator, &mut agents, detector).await;
        if outcome.is_err() {
            agents.set.abort_all();
            if let Some(handle) = detector_abort {
                handle.abort();
            }
        }
        let (swept, detector_report) = outcome?;

        let snapshot = coordinator.snapshot()?;
        if snapshot.ledger.available != snapshot.ledger.total {
            return Err(SimulationError::InvariantViolated {
                message: format!(
                    "run ended with available {} but total {}",
                    snapshot.ledger.available, snapshot.ledger.total
                ),
            }
            .into());
        }

        let report = SimulationReport {
            mode: scenario.mode,
            seed: scenario.seed,
            total: snapshot.ledger.total.clone(),
            available: snapshot.ledger.available.clone(),
            processes: snapshot.summaries(),
            cycles: detector_report.cycles,
            victims: detector_report.victims,
            swept,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        self.emit(AppEvent::Simulation(SimulationEvent::Completed {
            finished: report.count(ProcessState::Finished),
            aborted: report.count(ProcessState::Aborted),
            duration_ms: report.duration_ms,
        }));
        Ok(report)
    }

    /// Wait for the agents under the deadline, sweep stragglers, then
    /// collect the detector
    async fn drive(
        &self,
        coordinator: &Coordinator,
        agents: &mut Agents,
        detector: Option<JoinHandle<Result<DetectorReport, Error>>>,
    ) -> Result<(Vec<ProcessId>, DetectorReport), Error> {
        let joined = tokio::time::timeout(self.options.run_timeout, agents.join_all()).await;

        let swept = match joined {
            Ok(result) => {
                result?;
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.options.run_timeout.as_millis(),
                    "run deadline passed"
                );
                let swept = self.final_sweep(coordinator)?;
                agents.join_all().await?;
                swept
            }
        };

        let report = match detector {
            Some(handle) => handle.await.map_err(|e| SimulationError::DetectorFailed {
                message: e.to_string(),
            })??,
            None => DetectorReport::default(),
        };
        Ok((swept, report))
    }

    /// Force-abort every process that is not yet terminal
    fn final_sweep(&self, coordinator: &Coordinator) -> Result<Vec<ProcessId>, Error> {
        let remaining = coordinator.snapshot()?.unfinished();
        if remaining.is_empty() {
            return Ok(remaining);
        }

        self.emit(AppEvent::Detection(DetectionEvent::FinalSweep {
            remaining: remaining.clone(),
        }));
        for &process in &remaining {
            coordinator.abort(process, AbortReason::Deadline)?;
        }
        Ok(remaining)
    }
}

impl EventEmitter for Simulation {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.correlation_id = Some(format!("seed-{}", self.scenario.seed));
    }
}

/// Agent tasks plus the process each one drives
#[derive(Default)]
struct Agents {
    set: JoinSet<Result<ProcessState, Error>>,
    ids: HashMap<task::Id, ProcessId>,
}

impl Agents {
    async fn join_all(&mut self) -> Result<(), Error> {
        while let Some(joined) = self.set.join_next_with_id().await {
            let (id, result) = joined.map_err(|e| self.failed(e.id(), &e.to_string()))?;
            let state = result?;
            tracing::debug!(process = ?self.ids.get(&id), %state, "agent exited");
        }
        Ok(())
    }

    fn failed(&self, id: task::Id, message: &str) -> SimulationError {
        SimulationError::AgentFailed {
            process: self.ids.get(&id).map_or(usize::MAX, |p| p.index()),
            message: message.to_string(),
        }
    }
}
