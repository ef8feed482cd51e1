// src/lib.rs
// AnimeHub Player - Playback session controller for proxied anime streams
//
// Architecture:
// - Domain-centric: skip regions, watch progress and session identity live
//   in `domain` with their invariants
// - Event-driven: sessions report what happened through the event bus
// - Explicit: players, engines and the record store are injected contracts
// - One session task per mounted player; the manager keeps at most one live

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// HOST CONTRACTS
// ============================================================================

pub mod integrations;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    affordance_for,
    validate_skip_bounds,
    validate_watch_progress,
    // Session
    AnimeInfo,
    AudioMode,
    // Watch progress
    BookmarkHistory,
    BookmarkId,
    BookmarkRequest,
    BookmarkStatus,
    DomainError,
    EpisodeRef,
    // Upstream sources
    EpisodeSource,
    // Skip regions
    Highlight,
    PlaybackSource,
    RecordId,
    RegionEnd,
    SessionIdentity,
    SessionPhase,
    SkipAffordanceState,
    SkipKind,
    SkipMode,
    SkipRegion,
    SkipWindow,
    SourceEntry,
    // Subtitles
    SubtitleOption,
    SubtitleSetup,
    SubtitleTrack,
    SyncReason,
    Viewer,
    WatchProgress,
    WatchProgressRecord,
};

// ============================================================================
// PUBLIC API - Configuration & Errors
// ============================================================================

pub use config::ControllerConfig;
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    DomainEvent,
    EventBus,
    EventLogEntry,
    PlaybackErrorReported,
    ResumeApplied,
    SessionActivated,
    SessionTornDown,
    SkipPerformed,
    SourceUnresolvable,
    WatchProgressSyncFailed,
    WatchProgressSynced,
};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{PocketBaseAuth, PocketBaseRecordStore, RecordStore};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    EngineConfig,
    EngineEvent,
    HlsSupport,
    MediaTarget,
    PlaybackBackend,
    Player,
    PlayerEvent,
    PlayerOptions,
    StreamingEngine,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    encode_uri_component,
    GenerationCounter,
    Liveness,
    MountRequest,
    SeekInstruction,
    SessionCommand,
    SessionHandle,
    SessionManager,
    SkipDecision,
    SkipEngine,
    SourceResolver,
    WatchProgressSynchronizer,
    HLS_UNSUPPORTED_NOTICE,
};
