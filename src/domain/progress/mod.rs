pub mod entity;
pub mod invariants;

pub use entity::{
    BookmarkHistory, BookmarkId, BookmarkRequest, BookmarkStatus, RecordId, SyncReason, WatchProgress,
    WatchProgressRecord,
};
pub use invariants::validate_watch_progress;
