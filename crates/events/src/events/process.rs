use dlsim_types::{ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};

/// Why a process was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Chosen by the resolver to break a cycle
    Victim,
    /// Still unfinished when the run deadline passed
    Deadline,
}

/// Process lifecycle transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessEvent {
    /// Agent task started
    Started {
        process: ProcessId,
        max_demand: ResourceVector,
    },

    /// Process released everything and reached `Finished`
    Finished { process: ProcessId },

    /// Process was aborted and its allocation reclaimed
    Aborted {
        process: ProcessId,
        reason: AbortReason,
        released: ResourceVector,
        available: ResourceVector,
    },

    /// Agent observed its own abort and stopped
    Exiting { process: ProcessId },
}

impl ProcessEvent {
    /// `Started` is log-only and renders nothing
    #[must_use]
    pub fn console_line(&self) -> Option<String> {
        let line = match self {
            Self::Started { .. } => return None,
            Self::Finished { process } => format!("[proc {process}] finished"),
            Self::Aborted {
                process,
                reason,
                released,
                available,
            } => {
                let tag = match reason {
                    AbortReason::Victim => "resolve",
                    AbortReason::Deadline => "final",
                };
                format!("[{tag}] abort proc {process} -> released {released}, avail={available}")
            }
            Self::Exiting { process } => format!("[proc {process}] aborted, exiting"),
        };
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_lines() {
        let victim = ProcessEvent::Aborted {
            process: ProcessId(2),
            reason: AbortReason::Victim,
            released: ResourceVector::from([1, 1]),
            available: ResourceVector::from([1, 2]),
        };
        assert_eq!(
            victim.console_line().unwrap(),
            "[resolve] abort proc 2 -> released [1, 1], avail=[1, 2]"
        );
        let swept = ProcessEvent::Aborted {
            process: ProcessId(0),
            reason: AbortReason::Deadline,
            released: ResourceVector::from([0, 0]),
            available: ResourceVector::from([2, 2]),
        };
        assert!(swept.console_line().unwrap().starts_with("[final] abort proc 0"));
        assert_eq!(
            ProcessEvent::Exiting {
                process: ProcessId(2)
            }
            .console_line()
            .as_deref(),
            Some("[proc 2] aborted, exiting")
        );
    }
}
