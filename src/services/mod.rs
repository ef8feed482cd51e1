// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod liveness;
pub mod playback_session;
pub mod progress_sync;
pub mod session_manager;
pub mod skip_engine;
pub mod source_resolver;

#[cfg(test)]
mod test_support;



// Re-export all services and their types
pub use liveness::{GenerationCounter, Liveness};

pub use playback_session::{
    MountRequest,
    SessionCommand,
    SessionHandle,
    HLS_UNSUPPORTED_NOTICE,
};

pub use progress_sync::WatchProgressSynchronizer;

pub use session_manager::SessionManager;

pub use skip_engine::{
    SeekInstruction,
    SkipDecision,
    SkipEngine,
};

pub use source_resolver::{
    encode_uri_component,
    SourceResolver,
};
