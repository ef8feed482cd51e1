// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    PlaybackErrorReported,
    ResumeApplied,
    SessionActivated,
    SessionTornDown,
    SkipPerformed,
    SourceUnresolvable,
    WatchProgressSyncFailed,
    WatchProgressSynced,
};

pub use bus::{EventBus, EventLogEntry};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
