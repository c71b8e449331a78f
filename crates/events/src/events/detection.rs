use dlsim_types::ProcessId;
use serde::{Deserialize, Serialize};

use super::format_ids;

/// Deadlock detector findings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DetectionEvent {
    /// One detector pass finished
    ScanCompleted { waiting: usize, edges: usize },

    /// A circular wait was found and a victim picked
    CycleDetected {
        cycle: Vec<ProcessId>,
        victim: ProcessId,
    },

    /// Run deadline passed with unfinished processes
    FinalSweep { remaining: Vec<ProcessId> },
}

impl DetectionEvent {
    #[must_use]
    pub fn console_line(&self) -> Option<String> {
        match self {
            Self::ScanCompleted { .. } => None,
            Self::CycleDetected { cycle, victim } => Some(format!(
                "[detect] Deadlock cycle found: {}. Aborting victim proc {victim}",
                format_ids(cycle)
            )),
            Self::FinalSweep { remaining } => Some(format!(
                "[final] Forcing abort of remaining: {}",
                format_ids(remaining)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_line() {
        let event = DetectionEvent::CycleDetected {
            cycle: vec![ProcessId(0), ProcessId(2)],
            victim: ProcessId(2),
        };
        assert_eq!(
            event.console_line().as_deref(),
            Some("[detect] Deadlock cycle found: [0, 2]. Aborting victim proc 2")
        );
        assert!(DetectionEvent::ScanCompleted { waiting: 0, edges: 0 }
            .console_line()
            .is_none());
    }

    #[test]
    fn test_final_sweep_line() {
        let event = DetectionEvent::FinalSweep {
            remaining: vec![ProcessId(1), ProcessId(3)],
        };
        assert_eq!(
            event.console_line().as_deref(),
            Some("[final] Forcing abort of remaining: [1, 3]")
        );
    }
}
