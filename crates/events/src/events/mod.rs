use serde::{Deserialize, Serialize};

use crate::EventSource;
use dlsim_errors::UserFacingError;
use dlsim_types::ProcessId;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod allocation;
pub mod detection;
pub mod general;
pub mod process;
pub mod simulation;

pub use allocation::*;
pub use detection::*;
pub use general::*;
pub use process::*;
pub use simulation::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, debug logs)
    General(GeneralEvent),

    /// Grant, wait and release decisions made by the coordinator
    Allocation(AllocationEvent),

    /// Process lifecycle transitions
    Process(ProcessEvent),

    /// Deadlock detector findings
    Detection(DetectionEvent),

    /// Run start and completion
    Simulation(SimulationEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Allocation(_) => EventSource::ALLOCATION,
            Self::Process(_) => EventSource::PROCESS,
            Self::Detection(_) => EventSource::DETECTION,
            Self::Simulation(_) => EventSource::SIMULATION,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. })
            | Self::Simulation(SimulationEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Detection(DetectionEvent::CycleDetected { .. } | DetectionEvent::FinalSweep { .. })
            | Self::Process(ProcessEvent::Aborted { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Detection(DetectionEvent::ScanCompleted { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "dlsim::events::general",
            Self::Allocation(_) => "dlsim::events::allocation",
            Self::Process(_) => "dlsim::events::process",
            Self::Detection(_) => "dlsim::events::detection",
            Self::Simulation(_) => "dlsim::events::simulation",
        }
    }

    /// Stable console line for this event, if it has one
    ///
    /// General events and internal bookkeeping events render nothing; the
    /// CLI routes those through the logger instead.
    #[must_use]
    pub fn console_line(&self) -> Option<String> {
        match self {
            Self::General(_) => None,
            Self::Allocation(event) => Some(event.console_line()),
            Self::Process(event) => event.console_line(),
            Self::Detection(event) => event.console_line(),
            Self::Simulation(event) => event.console_line(),
        }
    }
}

/// Render process ids as `[0, 2, 3]`
#[must_use]
pub fn format_ids(ids: &[ProcessId]) -> String {
    let inner: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(", "))
}
