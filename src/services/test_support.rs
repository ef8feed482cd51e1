// src/services/test_support.rs
//
// Hand-written doubles for service tests: a record store whose lookups can
// be held in flight, and a playback backend that records every lifecycle
// call and exposes the event senders of the players and engines it built.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

use crate::domain::{
    AnimeInfo, AudioMode, BookmarkHistory, BookmarkId, BookmarkRequest, EpisodeRef,
    EpisodeSource, RecordId, SkipAffordanceState, SkipWindow, SourceEntry, SubtitleTrack, Viewer,
    WatchProgress, WatchProgressRecord,
};
use crate::error::{AppError, AppResult};
use crate::integrations::{
    EngineConfig, EngineEvent, HlsSupport, MediaTarget, PlaybackBackend, Player, PlayerEvent,
    PlayerOptions, StreamingEngine,
};
use crate::repositories::RecordStore;
use crate::services::MountRequest;

// ============================================================================
// RECORD STORE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Bookmark { anime_id: String },
    History { bookmark: String },
    Upsert {
        bookmark: String,
        record: Option<String>,
        current: f64,
    },
}

pub struct FakeRecordStore {
    calls: Mutex<Vec<StoreCall>>,
    bookmark: Option<BookmarkId>,
    history: Vec<WatchProgressRecord>,
    /// When set, bookmark lookups wait for a permit
    gate: Option<Arc<Semaphore>>,
    fail_history: AtomicBool,
    fail_upserts: AtomicBool,
    next_id: AtomicU32,
}

impl FakeRecordStore {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            bookmark: Some(BookmarkId::new("bm-1")),
            history: Vec::new(),
            gate: None,
            fail_history: AtomicBool::new(false),
            fail_upserts: AtomicBool::new(false),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn with_history(mut self, records: Vec<WatchProgressRecord>) -> Self {
        self.history = records;
        self
    }

    /// Bookmark lookups block until the returned semaphore gets a permit
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn fail_history(&self) {
        self.fail_history.store(true, Ordering::SeqCst);
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn upserts(&self) -> Vec<(Option<String>, f64)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Upsert {
                    record, current, ..
                } => Some((record.clone(), *current)),
                _ => None,
            })
            .collect()
    }

    /// Upserts issued without a record id
    pub fn creates(&self) -> usize {
        self.upserts()
            .iter()
            .filter(|(record, _)| record.is_none())
            .count()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn create_or_update_bookmark(
        &self,
        request: &BookmarkRequest,
    ) -> AppResult<Option<BookmarkId>> {
        self.calls.lock().push(StoreCall::Bookmark {
            anime_id: request.anime_id.clone(),
        });
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| AppError::Other(e.to_string()))?;
        }
        Ok(self.bookmark.clone())
    }

    async fn get_bookmark_with_history(&self, bookmark: &BookmarkId) -> AppResult<BookmarkHistory> {
        self.calls.lock().push(StoreCall::History {
            bookmark: bookmark.to_string(),
        });
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(AppError::RemoteStore {
                status: 500,
                message: "history unavailable".to_string(),
            });
        }
        Ok(BookmarkHistory {
            watch_history: self.history.clone(),
        })
    }

    async fn upsert_watch_progress(
        &self,
        bookmark: &BookmarkId,
        record: Option<RecordId>,
        progress: &WatchProgress,
    ) -> AppResult<RecordId> {
        self.calls.lock().push(StoreCall::Upsert {
            bookmark: bookmark.to_string(),
            record: record.as_ref().map(|id| id.to_string()),
            current: progress.current,
        });
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(AppError::RemoteStore {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        match record {
            Some(id) => Ok(id),
            None => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(RecordId::new(format!("w-{}", n)))
            }
        }
    }
}

pub fn history_record(id: &str, episode_id: &str, current: f64) -> WatchProgressRecord {
    WatchProgressRecord {
        id: RecordId::new(id),
        episode_id: episode_id.to_string(),
        episode_number: Some(1),
        current: Some(current),
        duration: Some(1430.0),
    }
}

// ============================================================================
// PLAYBACK BACKEND
// ============================================================================

#[derive(Debug, Default)]
pub struct PlayerState {
    pub options: Option<PlayerOptions>,
    pub current_time: f64,
    pub duration: f64,
    pub height: f64,
    pub loading: bool,
    pub seeks: Vec<f64>,
    pub notices: Vec<String>,
    pub skip_controls: Vec<SkipAffordanceState>,
    pub subtitle_visible: Vec<bool>,
    pub subtitle_switches: Vec<(String, String)>,
    pub font_sizes: Vec<f64>,
    pub native_uri: Option<String>,
    pub paused: bool,
    pub destroyed: bool,
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub config: Option<EngineConfig>,
    pub loaded: Option<String>,
    pub attached: Option<MediaTarget>,
    pub stopped: bool,
    pub destroyed: bool,
}

/// Test-side handle of a player built by [`FakeBackend`]
#[derive(Clone)]
pub struct PlayerProbe {
    pub state: Arc<Mutex<PlayerState>>,
    events: UnboundedSender<PlayerEvent>,
}

impl PlayerProbe {
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    /// Move the playhead and raise a time update
    pub fn tick(&self, current: f64) {
        self.state.lock().current_time = current;
        self.emit(PlayerEvent::TimeUpdate);
    }
}

/// Test-side handle of an engine built by [`FakeBackend`]
#[derive(Clone)]
pub struct EngineProbe {
    pub state: Arc<Mutex<EngineState>>,
    events: UnboundedSender<EngineEvent>,
}

impl EngineProbe {
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

pub struct FakeBackend {
    support: HlsSupport,
    duration: f64,
    lifecycle: Arc<Mutex<Vec<String>>>,
    players: Mutex<Vec<PlayerProbe>>,
    engines: Mutex<Vec<EngineProbe>>,
    fail_engine: AtomicBool,
}

impl FakeBackend {
    pub fn new(support: HlsSupport) -> Self {
        Self {
            support,
            duration: 1430.0,
            lifecycle: Arc::new(Mutex::new(Vec::new())),
            players: Mutex::new(Vec::new()),
            engines: Mutex::new(Vec::new()),
            fail_engine: AtomicBool::new(false),
        }
    }

    pub fn fail_engine(&self) {
        self.fail_engine.store(true, Ordering::SeqCst);
    }

    /// Ordered lifecycle calls, e.g. `"player#1 destroy"`
    pub fn lifecycle(&self) -> Vec<String> {
        self.lifecycle.lock().clone()
    }

    pub fn player(&self, index: usize) -> Option<PlayerProbe> {
        self.players.lock().get(index).cloned()
    }

    pub fn engine(&self, index: usize) -> Option<EngineProbe> {
        self.engines.lock().get(index).cloned()
    }

    pub fn player_count(&self) -> usize {
        self.players.lock().len()
    }
}

impl PlaybackBackend for FakeBackend {
    fn hls_support(&self) -> HlsSupport {
        self.support
    }

    fn create_player(&self, options: PlayerOptions) -> AppResult<Box<dyn Player>> {
        let mut players = self.players.lock();
        let n = players.len() + 1;
        let (tx, rx) = unbounded_channel();
        let state = Arc::new(Mutex::new(PlayerState {
            options: Some(options),
            duration: self.duration,
            height: 600.0,
            ..Default::default()
        }));
        players.push(PlayerProbe {
            state: Arc::clone(&state),
            events: tx,
        });
        self.lifecycle.lock().push(format!("player#{} create", n));

        Ok(Box::new(FakePlayer {
            n,
            state,
            events: Some(rx),
            lifecycle: Arc::clone(&self.lifecycle),
        }))
    }

    fn create_engine(&self, config: &EngineConfig) -> AppResult<Box<dyn StreamingEngine>> {
        if self.fail_engine.load(Ordering::SeqCst) {
            return Err(AppError::Other("engine unavailable".to_string()));
        }
        let mut engines = self.engines.lock();
        let n = engines.len() + 1;
        let (tx, rx) = unbounded_channel();
        let state = Arc::new(Mutex::new(EngineState {
            config: Some(config.clone()),
            ..Default::default()
        }));
        engines.push(EngineProbe {
            state: Arc::clone(&state),
            events: tx,
        });
        self.lifecycle.lock().push(format!("engine#{} create", n));

        Ok(Box::new(FakeEngine {
            n,
            state,
            events: Some(rx),
            lifecycle: Arc::clone(&self.lifecycle),
        }))
    }
}

struct FakePlayer {
    n: usize,
    state: Arc<Mutex<PlayerState>>,
    events: Option<UnboundedReceiver<PlayerEvent>>,
    lifecycle: Arc<Mutex<Vec<String>>>,
}

impl FakePlayer {
    fn log(&self, what: &str) {
        self.lifecycle.lock().push(format!("player#{} {}", self.n, what));
    }
}

impl Player for FakePlayer {
    fn media_target(&self) -> MediaTarget {
        MediaTarget(format!("video-{}", self.n))
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn height(&self) -> f64 {
        self.state.lock().height
    }

    fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.state.lock();
        state.current_time = seconds;
        state.seeks.push(seconds);
    }

    fn pause(&mut self) {
        self.state.lock().paused = true;
        self.log("pause");
    }

    fn show_notice(&mut self, message: &str) {
        self.state.lock().notices.push(message.to_string());
    }

    fn update_skip_control(&mut self, state: &SkipAffordanceState) {
        self.state.lock().skip_controls.push(*state);
    }

    fn set_subtitle_visible(&mut self, visible: bool) {
        self.state.lock().subtitle_visible.push(visible);
    }

    fn switch_subtitle(&mut self, url: &str, name: &str) {
        self.state
            .lock()
            .subtitle_switches
            .push((url.to_string(), name.to_string()));
    }

    fn set_subtitle_font_size(&mut self, px: f64) {
        self.state.lock().font_sizes.push(px);
    }

    fn play_native(&mut self, uri: &str) {
        self.state.lock().native_uri = Some(uri.to_string());
    }

    fn take_events(&mut self) -> Option<UnboundedReceiver<PlayerEvent>> {
        self.events.take()
    }

    fn destroy(&mut self) {
        self.state.lock().destroyed = true;
        self.log("destroy");
    }
}

struct FakeEngine {
    n: usize,
    state: Arc<Mutex<EngineState>>,
    events: Option<UnboundedReceiver<EngineEvent>>,
    lifecycle: Arc<Mutex<Vec<String>>>,
}

impl FakeEngine {
    fn log(&self, what: &str) {
        self.lifecycle.lock().push(format!("engine#{} {}", self.n, what));
    }
}

impl StreamingEngine for FakeEngine {
    fn load(&mut self, uri: &str) {
        self.state.lock().loaded = Some(uri.to_string());
    }

    fn attach(&mut self, target: &MediaTarget) {
        self.state.lock().attached = Some(target.clone());
    }

    fn stop_load(&mut self) {
        self.state.lock().stopped = true;
        self.log("stop_load");
    }

    fn take_events(&mut self) -> Option<UnboundedReceiver<EngineEvent>> {
        self.events.take()
    }

    fn destroy(&mut self) {
        self.state.lock().destroyed = true;
        self.log("destroy");
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn anime() -> AnimeInfo {
    AnimeInfo {
        id: "one-piece".to_string(),
        title: "One Piece".to_string(),
        image: "https://img.example/one-piece.jpg".to_string(),
    }
}

pub fn episode(id: &str) -> EpisodeRef {
    EpisodeRef::new(id, "1")
}

/// Playable source with intro [0, 85) and an open-ended outro from 1400
pub fn episode_source() -> EpisodeSource {
    EpisodeSource {
        sources: vec![SourceEntry {
            url: "https://cdn.example/ep1/master.m3u8".to_string(),
            is_m3u8: true,
            quality: None,
        }],
        headers: [("Referer".to_string(), "https://megacloud.example/".to_string())]
            .into_iter()
            .collect(),
        tracks: vec![
            SubtitleTrack {
                url: "en.vtt".to_string(),
                lang: "English".to_string(),
            },
            SubtitleTrack {
                url: "es.vtt".to_string(),
                lang: "Español".to_string(),
            },
        ],
        intro: Some(SkipWindow {
            start: Some(0.0),
            end: Some(85.0),
        }),
        outro: Some(SkipWindow {
            start: Some(1400.0),
            end: Some(0.0),
        }),
    }
}

pub fn mount_request(episode_id: &str, viewer: Viewer, auto_skip: bool) -> MountRequest {
    MountRequest {
        anime: anime(),
        episode: episode(episode_id),
        source: episode_source(),
        mode: AudioMode::Sub,
        auto_skip,
        viewer,
    }
}
