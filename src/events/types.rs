// events/types.rs
//
// All domain events emitted by playback sessions.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{SkipKind, SyncReason};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone + Send + Sync {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid { self.event_id }
            fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
            fn event_type(&self) -> &'static str { stringify!($name) }
        }
    };
}

// ============================================================================
// SESSION LIFECYCLE EVENTS
// ============================================================================

/// Emitted once the player and streaming engine are attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionActivated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub anime_id: String,
    pub episode_id: String,
    pub resolved_uri: String,
}

impl SessionActivated {
    pub fn new(session_id: Uuid, anime_id: String, episode_id: String, resolved_uri: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            anime_id,
            episode_id,
            resolved_uri,
        }
    }
}

domain_event!(SessionActivated);

/// Emitted when the upstream data has no playable source (yet)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnresolvable {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub episode_id: String,
}

impl SourceUnresolvable {
    pub fn new(session_id: Uuid, episode_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            episode_id,
        }
    }
}

domain_event!(SourceUnresolvable);

/// Emitted after the player and engine are released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTornDown {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub episode_id: String,
}

impl SessionTornDown {
    pub fn new(session_id: Uuid, episode_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            episode_id,
        }
    }
}

domain_event!(SessionTornDown);

// ============================================================================
// PLAYBACK EVENTS
// ============================================================================

/// Emitted when playback jumps past an intro or outro
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipPerformed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub region: SkipKind,
    pub from_seconds: f64,
    pub to_seconds: f64,
    /// false when the viewer pressed the skip button
    pub automatic: bool,
}

impl SkipPerformed {
    pub fn new(
        session_id: Uuid,
        region: SkipKind,
        from_seconds: f64,
        to_seconds: f64,
        automatic: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            region,
            from_seconds,
            to_seconds,
            automatic,
        }
    }
}

domain_event!(SkipPerformed);

/// Emitted when playback resumes from a stored position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeApplied {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub episode_id: String,
    pub position_seconds: f64,
}

impl ResumeApplied {
    pub fn new(session_id: Uuid, episode_id: String, position_seconds: f64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            episode_id,
            position_seconds,
        }
    }
}

domain_event!(ResumeApplied);

/// Emitted when the player or streaming engine reports an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackErrorReported {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub message: String,
    pub reconnect_attempt: Option<u32>,
}

impl PlaybackErrorReported {
    pub fn new(session_id: Uuid, message: String, reconnect_attempt: Option<u32>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            session_id,
            message,
            reconnect_attempt,
        }
    }
}

domain_event!(PlaybackErrorReported);

// ============================================================================
// WATCH PROGRESS EVENTS
// ============================================================================

/// Emitted when the record store accepted a progress write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchProgressSynced {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub episode_id: String,
    pub record_id: String,
    pub current_seconds: f64,
    pub reason: SyncReason,
}

impl WatchProgressSynced {
    pub fn new(episode_id: String, record_id: String, current_seconds: f64, reason: SyncReason) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            episode_id,
            record_id,
            current_seconds,
            reason,
        }
    }
}

domain_event!(WatchProgressSynced);

/// Emitted when a progress write failed; local state is left untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchProgressSyncFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub episode_id: String,
    pub reason: SyncReason,
    pub error: String,
}

impl WatchProgressSyncFailed {
    pub fn new(episode_id: String, reason: SyncReason, error: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            episode_id,
            reason,
            error,
        }
    }
}

domain_event!(WatchProgressSyncFailed);
