//! Built-in defaults for every configurable value

pub const DEFAULT_RESOURCES: [u32; 3] = [3, 3, 2];
pub const DEFAULT_PROCESSES: usize = 5;
pub const DEFAULT_SEED: u64 = 123;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_THINK_TIME_MIN_MS: u64 = 20;
pub const DEFAULT_THINK_TIME_MAX_MS: u64 = 60;
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_MAX_PER_STEP: u32 = 2;

/// Directory name used under the platform config and state dirs
pub const APP_DIR: &str = "dlsim";
