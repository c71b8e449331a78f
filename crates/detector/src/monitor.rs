//! Periodic deadlock detection

use std::time::Duration;

use dlsim_coordinator::Coordinator;
use dlsim_errors::Error;
use dlsim_types::ProcessId;
use serde::{Deserialize, Serialize};

use crate::resolve::{Resolution, Resolver};

/// What the detector did over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorReport {
    /// Passes that actually searched for a cycle
    pub scans: u64,
    pub cycles: Vec<Vec<ProcessId>>,
    pub victims: Vec<ProcessId>,
}

impl DetectorReport {
    fn record(&mut self, resolution: Resolution) {
        self.victims.push(resolution.victim);
        self.cycles.push(resolution.cycle);
    }
}

/// Background task that polls the coordinator for circular waits
#[derive(Debug, Clone)]
pub struct DeadlockDetector {
    coordinator: Coordinator,
    resolver: Resolver,
    poll_interval: Duration,
}

impl DeadlockDetector {
    #[must_use]
    pub fn new(coordinator: Coordinator, poll_interval: Duration) -> Self {
        Self {
            resolver: Resolver::new(coordinator.clone()),
            coordinator,
            poll_interval,
        }
    }

    /// Run a single detection pass now
    ///
    /// # Errors
    ///
    /// Fails only if the coordinator state is unusable.
    pub fn detect_once(&self) -> Result<Option<Resolution>, Error> {
        self.resolver.detect_and_resolve()
    }

    /// Poll every `poll_interval` until every process is terminal
    ///
    /// Passes where nobody is waiting are skipped.
    ///
    /// # Errors
    ///
    /// Fails only if the coordinator state is unusable.
    pub async fn run(self) -> Result<DetectorReport, Error> {
        let mut report = DetectorReport::default();
        tracing::debug!(interval_ms = self.poll_interval.as_millis(), "detector started");

        loop {
            tokio::time::sleep(self.poll_interval).await;

            if self.coordinator.all_terminal()? {
                break;
            }
            if self.coordinator.waiting_count()? == 0 {
                continue;
            }

            report.scans += 1;
            if let Some(resolution) = self.detect_once()? {
                tracing::debug!(
                    victim = %resolution.victim,
                    released = %resolution.released,
                    "cycle resolved"
                );
                report.record(resolution);
            }
        }

        tracing::debug!(scans = report.scans, "detector stopped");
        Ok(report)
    }
}
