// src/repositories/record_store.rs
//
// Remote record store contract.
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic (gating, throttling and retries live in services)
// - Returned ids are authoritative; callers never synthesize ids

use async_trait::async_trait;

use crate::domain::{BookmarkHistory, BookmarkId, BookmarkRequest, RecordId, WatchProgress};
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Idempotent per (viewer, anime). `None` when the store declined to
    /// hand out a bookmark.
    async fn create_or_update_bookmark(
        &self,
        request: &BookmarkRequest,
    ) -> AppResult<Option<BookmarkId>>;

    async fn get_bookmark_with_history(&self, bookmark: &BookmarkId) -> AppResult<BookmarkHistory>;

    /// Create (`record == None`) or update a watch-history row and return its id
    async fn upsert_watch_progress(
        &self,
        bookmark: &BookmarkId,
        record: Option<RecordId>,
        progress: &WatchProgress,
    ) -> AppResult<RecordId>;
}
