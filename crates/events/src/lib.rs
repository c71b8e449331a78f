#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in dlsim
//!
//! Every observable step of a simulation (grants, waits, releases, aborts,
//! detector findings) is emitted as a typed [`AppEvent`] over an unbounded
//! channel. Library crates never print; the CLI drains the channel and turns
//! events into console lines and tracing records.
//!
//! ## Architecture
//!
//! - **Domain-driven events**: grouped by functional area (Allocation, Process, Detection, ...)
//! - **Unified `EventEmitter` trait**: one API whether you hold a raw sender or a struct with one
//! - **Metadata envelope**: each event travels inside an [`EventMessage`] carrying [`EventMeta`]

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AbortReason, AllocationEvent, AppEvent, DetectionEvent, FailureContext, GeneralEvent,
    ProcessEvent, SimulationEvent,
};

use dlsim_types::{Mode, ProcessId, ResourceVector};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// An event together with the metadata captured when it was emitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from its domain and level
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }
}

/// Sending half of the event channel
pub type EventSender = UnboundedSender<EventMessage>;

/// Receiving half of the event channel
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout dlsim
///
/// Implementors only need to expose their sender. Test doubles can override
/// [`EventEmitter::emit_with_meta`] to capture messages instead.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Hook for setting the correlation id before a message is sent
    fn enrich_event_meta(&self, _event: &AppEvent, _meta: &mut EventMeta) {}

    /// Send a fully built message
    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Receiver gone means nobody is listening any more; keep going.
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        self.enrich_event_meta(&event, &mut meta);
        self.emit_with_meta(meta, event);
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit a grant decision
    fn emit_granted(
        &self,
        mode: Mode,
        process: ProcessId,
        request: ResourceVector,
        allocation: ResourceVector,
        available: ResourceVector,
    ) {
        self.emit(AppEvent::Allocation(AllocationEvent::Granted {
            mode,
            process,
            request,
            allocation,
            available,
        }));
    }

    /// Emit a deferred (waiting or blocked) request
    fn emit_deferred(
        &self,
        mode: Mode,
        process: ProcessId,
        request: ResourceVector,
        need: ResourceVector,
        available: ResourceVector,
    ) {
        self.emit(AppEvent::Allocation(AllocationEvent::Deferred {
            mode,
            process,
            request,
            need,
            available,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sender_emits_with_meta() {
        let (tx, mut rx) = channel();
        tx.emit_granted(
            Mode::Avoidance,
            ProcessId(1),
            ResourceVector::from([1, 0]),
            ResourceVector::from([1, 0]),
            ResourceVector::from([2, 2]),
        );
        let EventMessage { meta, event } = rx.recv().await.unwrap();
        assert_eq!(meta.source, EventSource::ALLOCATION);
        assert_eq!(meta.level, EventLevel::Info);
        assert_eq!(
            event.console_line().as_deref(),
            Some("[avoid][grant] proc 1 req=[1, 0] alloc=[1, 0] avail=[2, 2]")
        );
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_warning("nobody listening");
    }
}
