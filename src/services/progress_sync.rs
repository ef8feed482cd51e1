// src/services/progress_sync.rs
//
// Watch Progress Synchronizer
//
// Owns the link between the local playback clock and the remote
// watch-history row of one session.
//
// CRITICAL RULES:
// - Nothing is written before the viewer has watched MIN_WATCH_SECONDS
// - At most one automatic create per session (the min-watch flag gates it)
// - Periodic writes are spaced by the sync interval; forced writes
//   (pause, seek, teardown) bypass it and restart the interval clock
// - Record ids only come from the store, and only a live session adopts them
// - Failures are logged and swallowed; playback never depends on them

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;

use crate::config::ControllerConfig;
use crate::domain::{
    validate_watch_progress, AnimeInfo, BookmarkId, BookmarkRequest, BookmarkStatus, EpisodeRef,
    RecordId, SyncReason, Viewer, WatchProgress,
};
use crate::events::{EventBus, WatchProgressSyncFailed, WatchProgressSynced};
use crate::repositories::RecordStore;
use crate::services::liveness::Liveness;

pub struct WatchProgressSynchronizer {
    store: Arc<dyn RecordStore>,
    event_bus: Arc<EventBus>,
    liveness: Liveness,
    tasks: TaskTracker,

    min_watch_seconds: f64,
    sync_interval: Duration,
    resume_tail_guard: f64,

    episode: Option<EpisodeRef>,
    bookmark: Option<BookmarkId>,
    /// Shared with in-flight upserts so a live session adopts their result
    record: Arc<Mutex<Option<RecordId>>>,
    min_watch_met: bool,
    resume_point: Option<f64>,
    last_synced: Option<Instant>,
}

impl WatchProgressSynchronizer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        event_bus: Arc<EventBus>,
        liveness: Liveness,
        tasks: TaskTracker,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            store,
            event_bus,
            liveness,
            tasks,
            min_watch_seconds: config.min_watch_seconds,
            sync_interval: config.sync_interval(),
            resume_tail_guard: config.resume_tail_guard_seconds,
            episode: None,
            bookmark: None,
            record: Arc::new(Mutex::new(None)),
            min_watch_met: false,
            resume_point: None,
            last_synced: None,
        }
    }

    /// Resolve the bookmark and the resume point for `episode`.
    ///
    /// Anonymous viewers and missing ids leave the synchronizer inert
    /// without touching the network. Lookup failures leave it without a
    /// resume point or record id. Results arriving after the session was
    /// retired are dropped.
    pub async fn initialize(&mut self, viewer: Viewer, anime: &AnimeInfo, episode: &EpisodeRef) {
        self.reset();

        if viewer != Viewer::Authenticated
            || anime.id.trim().is_empty()
            || episode.episode_id.trim().is_empty()
        {
            debug!("progress tracking disabled for episode {:?}", episode.episode_id);
            return;
        }

        let request = BookmarkRequest {
            anime_id: anime.id.clone(),
            title: anime.title.clone(),
            image: anime.image.clone(),
            status: BookmarkStatus::Watching,
            completed: false,
        };

        let bookmark = match self.store.create_or_update_bookmark(&request).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("record store returned no bookmark for anime {}", anime.id);
                return;
            }
            Err(e) => {
                warn!("bookmark lookup failed for anime {}: {}", anime.id, e);
                return;
            }
        };

        if !self.liveness.is_current() {
            debug!("discarding stale bookmark lookup for anime {}", anime.id);
            return;
        }

        let history = self.store.get_bookmark_with_history(&bookmark).await;

        if !self.liveness.is_current() {
            debug!(
                "discarding stale history lookup for episode {}",
                episode.episode_id
            );
            return;
        }

        self.bookmark = Some(bookmark);
        self.episode = Some(episode.clone());

        match history {
            Ok(history) => {
                if let Some(existing) = history.find_episode(&episode.episode_id) {
                    *self.record.lock() = Some(existing.id.clone());
                    self.resume_point = existing.current;
                    self.min_watch_met = existing
                        .current
                        .is_some_and(|current| current >= self.min_watch_seconds);
                    info!(
                        "found watch history {} for episode {} (resume: {:?})",
                        existing.id, episode.episode_id, self.resume_point
                    );
                }
            }
            Err(e) => {
                warn!(
                    "watch history lookup failed for episode {}: {}",
                    episode.episode_id, e
                );
            }
        }
    }

    /// Per-tick bookkeeping: the one-time create, then the periodic checkpoint
    pub fn on_time_update(&mut self, current: f64, duration: f64) {
        if self.bookmark.is_none() {
            return;
        }

        if !self.min_watch_met && current >= self.min_watch_seconds {
            self.min_watch_met = true;
            if !self.has_record() && self.dispatch(SyncReason::Create, current, duration) {
                self.last_synced = Some(Instant::now());
            }
        }

        if self.is_eligible()
            && self.interval_elapsed()
            && self.dispatch(SyncReason::Periodic, current, duration)
        {
            self.last_synced = Some(Instant::now());
        }
    }

    /// Immediate write on pause or seek; restarts the interval clock
    pub fn on_pause_or_seek(&mut self, current: f64, duration: f64) {
        if self.bookmark.is_none() || !self.is_eligible() {
            return;
        }
        if self.dispatch(SyncReason::Forced, current, duration) {
            self.last_synced = Some(Instant::now());
        }
    }

    /// Final write before the player goes away. The result is never adopted.
    pub fn on_teardown(&mut self, current: f64, duration: f64) {
        if self.bookmark.is_none() || !self.is_eligible() {
            return;
        }
        self.dispatch(SyncReason::Teardown, current, duration);
    }

    /// Consume the resume point. Returns it only if it is positive and
    /// clear of the last seconds of the episode.
    pub fn take_resume_point(&mut self, duration: f64) -> Option<f64> {
        let point = self.resume_point.take()?;
        let usable = point > 0.0
            && duration.is_finite()
            && duration > 0.0
            && point < duration - self.resume_tail_guard;

        if usable {
            Some(point)
        } else {
            debug!("discarding resume point {}s (duration {}s)", point, duration);
            None
        }
    }

    /// Wait for every write spawned so far
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    pub fn bookmark(&self) -> Option<&BookmarkId> {
        self.bookmark.as_ref()
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record.lock().clone()
    }

    pub fn min_watch_met(&self) -> bool {
        self.min_watch_met
    }

    pub fn resume_point(&self) -> Option<f64> {
        self.resume_point
    }

    pub fn is_tracking(&self) -> bool {
        self.bookmark.is_some()
    }

    fn reset(&mut self) {
        self.episode = None;
        self.bookmark = None;
        *self.record.lock() = None;
        self.min_watch_met = false;
        self.resume_point = None;
        self.last_synced = None;
    }

    fn has_record(&self) -> bool {
        self.record.lock().is_some()
    }

    fn is_eligible(&self) -> bool {
        self.min_watch_met || self.has_record()
    }

    fn interval_elapsed(&self) -> bool {
        self.last_synced
            .map_or(true, |at| at.elapsed() >= self.sync_interval)
    }

    /// Spawn one upsert on the shared tracker. Returns false when nothing
    /// was sent.
    fn dispatch(&self, reason: SyncReason, current: f64, duration: f64) -> bool {
        let (Some(bookmark), Some(episode)) = (self.bookmark.clone(), self.episode.as_ref()) else {
            return false;
        };

        let progress = WatchProgress {
            episode_id: episode.episode_id.clone(),
            episode_number: episode.number(),
            current,
            duration,
        };
        if let Err(e) = validate_watch_progress(&progress) {
            debug!("skipping {} sync: {}", reason, e);
            return false;
        }

        let record = self.record.lock().clone();
        let slot = Arc::clone(&self.record);
        let store = Arc::clone(&self.store);
        let event_bus = Arc::clone(&self.event_bus);
        let liveness = self.liveness.clone();

        debug!(
            "{} sync for episode {} at {:.1}s (record: {:?})",
            reason, progress.episode_id, current, record
        );

        self.tasks.spawn(async move {
            match store.upsert_watch_progress(&bookmark, record, &progress).await {
                Ok(id) => {
                    if reason != SyncReason::Teardown && liveness.is_current() {
                        *slot.lock() = Some(id.clone());
                    } else {
                        debug!("not adopting record {} from {} sync", id, reason);
                    }
                    event_bus.emit(WatchProgressSynced::new(
                        progress.episode_id,
                        id.to_string(),
                        progress.current,
                        reason,
                    ));
                }
                Err(e) => {
                    warn!(
                        "{} sync failed for episode {}: {}",
                        reason, progress.episode_id, e
                    );
                    event_bus.emit(WatchProgressSyncFailed::new(
                        progress.episode_id,
                        reason,
                        e.to_string(),
                    ));
                }
            }
        });
        true
    }
}
