//! Process identity, lifecycle state and allocation policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dense process identifier (`0..n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl ProcessId {
    /// Index into per-process tables
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ProcessId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a simulated process
///
/// `Running -> Waiting -> Running | Aborted`, `Running -> Finished`.
/// `Aborted` and `Finished` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Waiting,
    Aborted,
    Finished,
}

impl ProcessState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Finished)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Aborted => "aborted",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadlock handling policy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Banker's algorithm: only grant requests that keep the state safe
    #[default]
    Avoidance,
    /// Grant greedily, detect circular waits and abort a victim
    Detection,
}

impl Mode {
    /// Short tag used in console lines (`[avoid]`, `[detect]`)
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Avoidance => "avoid",
            Self::Detection => "detect",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avoidance => "avoidance",
            Self::Detection => "detection",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avoidance" => Ok(Self::Avoidance),
            "detection" => Ok(Self::Detection),
            other => Err(format!(
                "unknown mode '{other}': expected avoidance or detection"
            )),
        }
    }
}

// Implement clap::ValueEnum for Mode
impl clap::ValueEnum for Mode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Avoidance, Self::Detection]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Avoidance => clap::builder::PossibleValue::new("avoidance")
                .help("Banker's algorithm, never deadlocks"),
            Self::Detection => clap::builder::PossibleValue::new("detection")
                .help("Greedy grants, detect and resolve deadlocks"),
        })
    }
}

/// How a suspended request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Granted,
    /// The process was chosen as a victim (or swept at the deadline).
    /// Terminal: the caller must not retry.
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("Detection".parse::<Mode>().unwrap(), Mode::Detection);
        assert_eq!(" avoidance ".parse::<Mode>().unwrap(), Mode::Avoidance);
        assert!("banker".parse::<Mode>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProcessState::Aborted.is_terminal());
        assert!(ProcessState::Finished.is_terminal());
        assert!(!ProcessState::Waiting.is_terminal());
        assert!(!ProcessState::Running.is_terminal());
    }
}
