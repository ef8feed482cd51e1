// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod progress;
pub mod session;
pub mod skip;
pub mod source;
pub mod subtitle;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Skip regions
pub use skip::{
    affordance_for, validate_skip_bounds, Highlight, RegionEnd, SkipAffordanceState, SkipKind,
    SkipMode, SkipRegion,
};

// Watch progress
pub use progress::{
    validate_watch_progress, BookmarkHistory, BookmarkId, BookmarkRequest, BookmarkStatus,
    RecordId, SyncReason, WatchProgress, WatchProgressRecord,
};

// Session
pub use session::{AnimeInfo, AudioMode, EpisodeRef, SessionIdentity, SessionPhase, Viewer};

// Upstream sources
pub use source::{EpisodeSource, PlaybackSource, SkipWindow, SourceEntry};

// Subtitles
pub use subtitle::{SubtitleOption, SubtitleSetup, SubtitleTrack};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Progress {progress}s exceeds duration {duration}s")]
    ProgressExceedsDuration { progress: f64, duration: f64 },

    #[error("Skip region [{start}, {end}) is empty or inverted")]
    InvalidSkipRegion { start: f64, end: f64 },

    #[error("Non-finite time value: {0}")]
    NonFiniteTime(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
