//! Configuration sections

use crate::constants::{
    DEFAULT_MAX_PER_STEP, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROCESSES, DEFAULT_RESOURCES,
    DEFAULT_RUN_TIMEOUT_MS, DEFAULT_SEED, DEFAULT_THINK_TIME_MAX_MS, DEFAULT_THINK_TIME_MIN_MS,
};
use dlsim_types::{ColorChoice, Mode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Scenario shape: policy, resource totals, process count and seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_resources")]
    pub resources: Vec<u32>,
    #[serde(default = "default_processes")]
    pub processes: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            resources: default_resources(),
            processes: DEFAULT_PROCESSES,
            seed: DEFAULT_SEED,
        }
    }
}

/// Detector polling, agent think time and the run deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_think_time_min_ms")]
    pub think_time_min_ms: u64,
    #[serde(default = "default_think_time_max_ms")]
    pub think_time_max_ms: u64,
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
    /// Run on a paused single-threaded clock so runs are reproducible
    #[serde(default = "default_virtual_clock")]
    pub virtual_clock: bool,
}

impl TimingConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    #[must_use]
    pub fn think_time(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.think_time_min_ms),
            Duration::from_millis(self.think_time_max_ms),
        )
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            think_time_min_ms: DEFAULT_THINK_TIME_MIN_MS,
            think_time_max_ms: DEFAULT_THINK_TIME_MAX_MS,
            run_timeout_ms: DEFAULT_RUN_TIMEOUT_MS,
            virtual_clock: true,
        }
    }
}

/// Request generation knobs for process agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on any single component of one request
    #[serde(default = "default_max_per_step")]
    pub max_per_step: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_per_step: DEFAULT_MAX_PER_STEP,
        }
    }
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub log_dir: Option<PathBuf>,
}

// Default value functions for serde
fn default_resources() -> Vec<u32> {
    DEFAULT_RESOURCES.to_vec()
}

fn default_processes() -> usize {
    DEFAULT_PROCESSES
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_think_time_min_ms() -> u64 {
    DEFAULT_THINK_TIME_MIN_MS
}

fn default_think_time_max_ms() -> u64 {
    DEFAULT_THINK_TIME_MAX_MS
}

fn default_run_timeout_ms() -> u64 {
    DEFAULT_RUN_TIMEOUT_MS
}

fn default_virtual_clock() -> bool {
    true
}

fn default_max_per_step() -> u32 {
    DEFAULT_MAX_PER_STEP
}
