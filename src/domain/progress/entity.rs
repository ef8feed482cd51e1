use serde::{Deserialize, Serialize};

/// Remote identifier of a bookmark ("viewer is tracking this anime")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

/// Remote identifier of a watch-history row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

macro_rules! remote_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(BookmarkId);
remote_id!(RecordId);

/// Bookmark status as stored remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookmarkStatus {
    Watching,
    Completed,
    PlanToWatch,
    OnHold,
    Dropped,
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Watching => "watching",
            BookmarkStatus::Completed => "completed",
            BookmarkStatus::PlanToWatch => "plan-to-watch",
            BookmarkStatus::OnHold => "on-hold",
            BookmarkStatus::Dropped => "dropped",
        }
    }
}

/// Arguments of the idempotent create-or-update bookmark call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRequest {
    pub anime_id: String,
    pub title: String,
    pub image: String,
    pub status: BookmarkStatus,
    pub completed: bool,
}

/// Why a progress write was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncReason {
    /// First crossing of the minimum watch time
    Create,
    /// Interval-gated checkpoint on a time update
    Periodic,
    /// Pause or seek
    Forced,
    /// Final write while the session is torn down
    Teardown,
}

impl std::fmt::Display for SyncReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncReason::Create => "create",
            SyncReason::Periodic => "periodic",
            SyncReason::Forced => "forced",
            SyncReason::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// Progress payload sent with every upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub episode_id: String,
    pub episode_number: Option<u32>,
    pub current: f64,
    pub duration: f64,
}

/// A persisted watch-history row, one per (bookmark, episode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgressRecord {
    pub id: RecordId,
    pub episode_id: String,
    #[serde(default)]
    pub episode_number: Option<u32>,
    /// Missing when the row was written without a position
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// A bookmark together with its expanded watch history
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkHistory {
    #[serde(default)]
    pub watch_history: Vec<WatchProgressRecord>,
}

impl BookmarkHistory {
    /// First history row for `episode_id`
    pub fn find_episode(&self, episode_id: &str) -> Option<&WatchProgressRecord> {
        self.watch_history
            .iter()
            .find(|record| record.episode_id == episode_id)
    }
}
