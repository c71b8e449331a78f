use dlsim_types::{Mode, ResourceVector};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::FailureContext;

/// Run start and completion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimulationEvent {
    /// Scenario generated and agents about to start
    Started {
        mode: Mode,
        seed: u64,
        total: ResourceVector,
        max_demand: Vec<ResourceVector>,
    },

    /// Every process reached a terminal state
    Completed {
        finished: usize,
        aborted: usize,
        duration_ms: u64,
    },

    /// The run stopped on an error
    Failed { failure: FailureContext },
}

impl SimulationEvent {
    #[must_use]
    pub fn console_line(&self) -> Option<String> {
        match self {
            Self::Started {
                mode,
                total,
                max_demand,
                ..
            } => {
                let mut out = format!(
                    "Mode={mode} total={total} n={}\nMax demand per process:",
                    max_demand.len()
                );
                for (i, row) in max_demand.iter().enumerate() {
                    let _ = write!(out, "\n  P{i}: {row}");
                }
                Some(out)
            }
            Self::Completed { .. } => Some("All done.".to_string()),
            Self::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_banner() {
        let event = SimulationEvent::Started {
            mode: Mode::Detection,
            seed: 0,
            total: ResourceVector::from([3, 3, 2]),
            max_demand: vec![ResourceVector::from([1, 2, 0]), ResourceVector::from([3, 0, 1])],
        };
        assert_eq!(
            event.console_line().unwrap(),
            "Mode=detection total=[3, 3, 2] n=2\nMax demand per process:\n  P0: [1, 2, 0]\n  P1: [3, 0, 1]"
        );
    }
}
