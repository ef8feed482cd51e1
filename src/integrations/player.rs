// src/integrations/player.rs
//
// Player & Streaming Engine Contracts
//
// ARCHITECTURE:
// - The on-screen player and the HLS engine are owned by the host (browser,
//   desktop shell, test double). This module only describes what the
//   session controller needs from them.
// - Each instance is exclusively owned by one session and destroyed by it.
// - Events flow to the session over unbounded channels; dropping the
//   receiver is how a session unsubscribes.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::domain::{Highlight, SkipAffordanceState, SubtitleSetup};
use crate::error::AppResult;

/// Lifecycle and playback events raised by the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready,
    Resize,
    TimeUpdate,
    Pause,
    Seeked,
    Error { message: String },
    /// The host destroyed the player on its own
    Destroy,
}

/// Events raised by the streaming engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Manifest loaded and media attached
    Ready,
    Error {
        message: String,
        fatal: bool,
        reconnect_attempt: u32,
    },
}

/// Opaque handle of the media element the engine feeds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaTarget(pub String);

/// How the host can play HLS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HlsSupport {
    /// Through a streaming engine attached to the media element
    Engine,
    /// The media element plays the playlist natively
    Native,
    Unsupported,
}

/// Streaming engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    /// Seconds of already-played media kept in the buffer
    pub back_buffer_length: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
            back_buffer_length: 90,
        }
    }
}

/// Construction options for a player bound to one episode
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub url: String,
    pub poster: String,
    pub subtitles: SubtitleSetup,
    pub highlights: Vec<Highlight>,
    pub auto_skip: bool,
}

/// The on-screen player
pub trait Player: Send {
    fn media_target(&self) -> MediaTarget;
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn height(&self) -> f64;
    /// True while the player shows its buffering indicator
    fn is_loading(&self) -> bool;

    fn seek(&mut self, seconds: f64);
    fn pause(&mut self);
    fn show_notice(&mut self, message: &str);
    fn update_skip_control(&mut self, state: &SkipAffordanceState);

    fn set_subtitle_visible(&mut self, visible: bool);
    fn switch_subtitle(&mut self, url: &str, name: &str);
    fn set_subtitle_font_size(&mut self, px: f64);

    /// Hand the playlist straight to the media element
    fn play_native(&mut self, uri: &str);

    /// Event stream; yields `Some` only on the first call
    fn take_events(&mut self) -> Option<UnboundedReceiver<PlayerEvent>>;

    fn destroy(&mut self);
}

/// The HLS streaming engine
pub trait StreamingEngine: Send {
    fn load(&mut self, uri: &str);
    fn attach(&mut self, target: &MediaTarget);
    /// Stop fetching segments; the instance stays usable until `destroy`
    fn stop_load(&mut self);
    fn take_events(&mut self) -> Option<UnboundedReceiver<EngineEvent>>;
    fn destroy(&mut self);
}

/// Factory the host provides for players and engines
pub trait PlaybackBackend: Send + Sync {
    fn hls_support(&self) -> HlsSupport;
    fn create_player(&self, options: PlayerOptions) -> AppResult<Box<dyn Player>>;
    fn create_engine(&self, config: &EngineConfig) -> AppResult<Box<dyn StreamingEngine>>;
}
