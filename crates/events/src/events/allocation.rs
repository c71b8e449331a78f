use dlsim_types::{Mode, ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};

/// Decisions the coordinator makes about resource requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AllocationEvent {
    /// A request was granted; `allocation` and `available` are post-grant
    Granted {
        mode: Mode,
        process: ProcessId,
        request: ResourceVector,
        allocation: ResourceVector,
        available: ResourceVector,
    },

    /// A request could not be granted and the process now waits
    Deferred {
        mode: Mode,
        process: ProcessId,
        request: ResourceVector,
        need: ResourceVector,
        available: ResourceVector,
    },

    /// A finishing process handed back everything it held
    Released {
        process: ProcessId,
        released: ResourceVector,
        available: ResourceVector,
    },
}

impl AllocationEvent {
    #[must_use]
    pub fn console_line(&self) -> String {
        match self {
            Self::Granted {
                mode,
                process,
                request,
                allocation,
                available,
            } => format!(
                "[{}][grant] proc {process} req={request} alloc={allocation} avail={available}",
                mode.tag()
            ),
            Self::Deferred {
                mode,
                process,
                request,
                need,
                available,
            } => {
                let verdict = match mode {
                    Mode::Avoidance => "wait ",
                    Mode::Detection => "block",
                };
                format!(
                    "[{}][{verdict}] proc {process} req={request} need={need} avail={available}",
                    mode.tag()
                )
            }
            Self::Released {
                process,
                released,
                available,
            } => format!("[proc {process}] release_all={released} avail={available}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_lines() {
        let wait = AllocationEvent::Deferred {
            mode: Mode::Avoidance,
            process: ProcessId(0),
            request: ResourceVector::from([2, 0]),
            need: ResourceVector::from([3, 1]),
            available: ResourceVector::from([1, 1]),
        };
        assert_eq!(
            wait.console_line(),
            "[avoid][wait ] proc 0 req=[2, 0] need=[3, 1] avail=[1, 1]"
        );

        let block = AllocationEvent::Deferred {
            mode: Mode::Detection,
            process: ProcessId(4),
            request: ResourceVector::from([1]),
            need: ResourceVector::from([1]),
            available: ResourceVector::from([0]),
        };
        assert_eq!(
            block.console_line(),
            "[detect][block] proc 4 req=[1] need=[1] avail=[0]"
        );
    }

    #[test]
    fn test_released_line() {
        let event = AllocationEvent::Released {
            process: ProcessId(2),
            released: ResourceVector::from([1, 0, 2]),
            available: ResourceVector::from([3, 3, 2]),
        };
        assert_eq!(
            event.console_line(),
            "[proc 2] release_all=[1, 0, 2] avail=[3, 3, 2]"
        );
    }
}
