// src/services/playback_session.rs
//
// Playback Session
//
// One task per mounted player. The task exclusively owns the player, the
// streaming engine, the skip engine and the progress synchronizer, and
// serializes viewer commands, player events and engine events through a
// single select loop.
//
// LIFECYCLE:
//   Uninitialized -> Resolving -> Active | Placeholder -> TornDown
//
// CRITICAL RULES:
// - No player is built before the previous session reached TornDown
// - Teardown order: stop engine, final sync, destroy engine, destroy player,
//   then timers and subscriptions go away with the task
// - TornDown is terminal; the task ends right after publishing it

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::domain::subtitle::{clamped_font_size_for_height, font_size_for_height};
use crate::domain::{
    AnimeInfo, AudioMode, EpisodeRef, EpisodeSource, PlaybackSource, SessionIdentity,
    SessionPhase, SkipAffordanceState, SubtitleSetup, Viewer,
};
use crate::error::AppResult;
use crate::events::{
    EventBus, PlaybackErrorReported, ResumeApplied, SessionActivated, SessionTornDown,
    SkipPerformed, SourceUnresolvable,
};
use crate::integrations::{
    EngineEvent, HlsSupport, PlaybackBackend, Player, PlayerEvent, PlayerOptions, StreamingEngine,
};
use crate::repositories::RecordStore;
use crate::services::liveness::Liveness;
use crate::services::progress_sync::WatchProgressSynchronizer;
use crate::services::skip_engine::{SeekInstruction, SkipEngine};

pub const HLS_UNSUPPORTED_NOTICE: &str = "La reproducción HLS no es compatible con tu navegador.";

/// Everything the host knows when it mounts a player
#[derive(Debug, Clone)]
pub struct MountRequest {
    pub anime: AnimeInfo,
    pub episode: EpisodeRef,
    pub source: EpisodeSource,
    pub mode: AudioMode,
    /// Initial auto-skip preference
    pub auto_skip: bool,
    pub viewer: Viewer,
}

/// Viewer actions forwarded to the session task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SetAutoSkip(bool),
    /// The manual skip button was pressed
    ManualSkip,
    ShowSubtitles(bool),
    SelectSubtitle { url: String, name: String },
    Teardown,
}

/// The manager's view of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub identity: SessionIdentity,
    pub(crate) commands: UnboundedSender<SessionCommand>,
    pub(crate) phase: watch::Receiver<SessionPhase>,
}

impl SessionHandle {
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.clone()
    }

    /// `false` once the task is gone
    pub(crate) fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }
}

/// Shared collaborators handed to every session
#[derive(Clone)]
pub(crate) struct SessionDeps {
    pub backend: Arc<dyn PlaybackBackend>,
    pub store: Arc<dyn RecordStore>,
    pub event_bus: Arc<EventBus>,
    pub config: Arc<ControllerConfig>,
    pub tasks: TaskTracker,
}

/// Resume seek waiting for the settle delay
#[derive(Debug, Clone, Copy)]
struct PendingResume {
    deadline: Instant,
    target: f64,
}

pub(crate) struct PlaybackSession {
    id: Uuid,
    request: MountRequest,
    source: Option<PlaybackSource>,
    deps: SessionDeps,
    phase: watch::Sender<SessionPhase>,
    /// Phase of the session this one replaces
    previous: Option<watch::Receiver<SessionPhase>>,

    skip: SkipEngine,
    sync: WatchProgressSynchronizer,
    player: Option<Box<dyn Player>>,
    engine: Option<Box<dyn StreamingEngine>>,
    last_affordance: Option<SkipAffordanceState>,
}

impl PlaybackSession {
    /// Build the session and the handle the manager keeps
    pub(crate) fn new(
        request: MountRequest,
        source: Option<PlaybackSource>,
        deps: SessionDeps,
        liveness: Liveness,
        previous: Option<watch::Receiver<SessionPhase>>,
    ) -> (Self, SessionHandle, UnboundedReceiver<SessionCommand>) {
        let id = Uuid::new_v4();
        let (commands_tx, commands_rx) = tokio::sync::mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Uninitialized);

        let identity = SessionIdentity::new(
            &request.anime,
            &request.episode,
            request.mode,
            request.auto_skip,
            &request.source,
            source.as_ref(),
        );

        let skip = SkipEngine::from_episode(
            &request.source,
            request.auto_skip,
            deps.config.outro_end_margin_seconds,
        );
        let sync = WatchProgressSynchronizer::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.event_bus),
            liveness,
            deps.tasks.clone(),
            &deps.config,
        );

        let handle = SessionHandle {
            id,
            identity,
            commands: commands_tx,
            phase: phase_rx,
        };

        let session = Self {
            id,
            request,
            source,
            deps,
            phase: phase_tx,
            previous,
            skip,
            sync,
            player: None,
            engine: None,
            last_affordance: None,
        };

        (session, handle, commands_rx)
    }

    pub(crate) async fn run(mut self, mut commands: UnboundedReceiver<SessionCommand>) {
        self.set_phase(SessionPhase::Resolving);

        let Some(source) = self.source.clone() else {
            warn!(
                "session {}: no playable source for episode {}",
                self.id, self.request.episode.episode_id
            );
            self.deps.event_bus.emit(SourceUnresolvable::new(
                self.id,
                self.request.episode.episode_id.clone(),
            ));
            self.set_phase(SessionPhase::Placeholder);
            self.idle_until_teardown(&mut commands).await;
            self.finish().await;
            return;
        };

        if !self.resolve(&mut commands).await {
            debug!("session {} torn down while resolving", self.id);
            self.finish().await;
            return;
        }

        if let Err(e) = self.activate(&source) {
            error!("session {}: player construction failed: {}", self.id, e);
            self.release_resources();
            self.set_phase(SessionPhase::Placeholder);
            self.idle_until_teardown(&mut commands).await;
            self.finish().await;
            return;
        }

        self.set_phase(SessionPhase::Active);
        self.deps.event_bus.emit(SessionActivated::new(
            self.id,
            self.request.anime.id.clone(),
            self.request.episode.episode_id.clone(),
            source.resolved_uri.clone(),
        ));
        info!(
            "session {} active for episode {}",
            self.id, self.request.episode.episode_id
        );

        let mut player_events = self.player.as_mut().and_then(|player| player.take_events());
        let mut engine_events = self.engine.as_mut().and_then(|engine| engine.take_events());
        let mut resume: Option<PendingResume> = None;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(SessionCommand::Teardown) | None => break,
                    Some(command) => self.handle_command(command),
                },

                Some(event) = next_event(&mut player_events) => match event {
                    PlayerEvent::Destroy => {
                        info!("session {}: player destroyed by host", self.id);
                        break;
                    }
                    PlayerEvent::Ready => {
                        if let Some(target) = self.on_ready() {
                            resume = Some(PendingResume {
                                deadline: Instant::now() + self.deps.config.resume_settle_delay(),
                                target,
                            });
                        }
                    }
                    event => self.handle_player_event(event),
                },

                Some(event) = next_event(&mut engine_events) => self.handle_engine_event(event),

                target = resume_due(&mut resume) => self.apply_resume(target),
            }
        }

        self.teardown();
        drop(resume);
        drop(player_events);
        drop(engine_events);
        self.finish().await;
    }

    /// Wait for the bookmark lookup and for the previous session to let go
    /// of the player. Returns `false` if a teardown arrived first.
    async fn resolve(&mut self, commands: &mut UnboundedReceiver<SessionCommand>) -> bool {
        let PlaybackSession {
            id,
            request,
            previous,
            skip,
            sync,
            ..
        } = self;

        let ready = async {
            tokio::join!(
                sync.initialize(request.viewer, &request.anime, &request.episode),
                wait_for_release(previous.clone()),
            )
        };
        tokio::pin!(ready);

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(SessionCommand::Teardown) | None => return false,
                    Some(SessionCommand::SetAutoSkip(enabled)) => skip.set_auto_skip(enabled),
                    Some(command) => debug!("session {}: ignoring {:?} while resolving", id, command),
                },

                _ = &mut ready => return true,
            }
        }
    }

    fn activate(&mut self, source: &PlaybackSource) -> AppResult<()> {
        let options = PlayerOptions {
            url: source.resolved_uri.clone(),
            poster: self.request.anime.image.clone(),
            subtitles: SubtitleSetup::for_mode(&self.request.source.tracks, self.request.mode),
            highlights: self.skip.highlights(),
            auto_skip: self.skip.auto_skip(),
        };

        let player = self.deps.backend.create_player(options)?;
        let target = player.media_target();
        let player = self.player.insert(player);

        match self.deps.backend.hls_support() {
            HlsSupport::Engine => {
                let mut engine = self.deps.backend.create_engine(&self.deps.config.engine)?;
                engine.load(&source.resolved_uri);
                engine.attach(&target);
                self.engine = Some(engine);
            }
            HlsSupport::Native => {
                debug!("session {}: using native HLS playback", self.id);
                player.play_native(&source.resolved_uri);
            }
            HlsSupport::Unsupported => {
                warn!("session {}: HLS playback is not supported", self.id);
                player.show_notice(HLS_UNSUPPORTED_NOTICE);
            }
        }

        Ok(())
    }

    async fn idle_until_teardown(&mut self, commands: &mut UnboundedReceiver<SessionCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                SessionCommand::Teardown => return,
                SessionCommand::SetAutoSkip(enabled) => self.skip.set_auto_skip(enabled),
                other => debug!("session {}: ignoring {:?} without a player", self.id, other),
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetAutoSkip(enabled) => {
                info!("session {}: auto-skip {}", self.id, if enabled { "on" } else { "off" });
                self.skip.set_auto_skip(enabled);
                self.last_affordance = None;
            }
            SessionCommand::ManualSkip => self.on_manual_skip(),
            SessionCommand::ShowSubtitles(visible) => {
                if let Some(player) = self.player.as_mut() {
                    player.set_subtitle_visible(visible);
                }
            }
            SessionCommand::SelectSubtitle { url, name } => {
                if let Some(player) = self.player.as_mut() {
                    player.switch_subtitle(&url, &name);
                    player.set_subtitle_visible(true);
                }
            }
            SessionCommand::Teardown => {}
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TimeUpdate => self.on_time_update(),
            PlayerEvent::Pause | PlayerEvent::Seeked => {
                if let Some(player) = self.player.as_ref() {
                    let (current, duration) = (player.current_time(), player.duration());
                    self.sync.on_pause_or_seek(current, duration);
                }
            }
            PlayerEvent::Resize => {
                if let Some(player) = self.player.as_mut() {
                    let size = clamped_font_size_for_height(player.height());
                    player.set_subtitle_font_size(size);
                }
            }
            PlayerEvent::Error { message } => {
                error!("session {}: player error: {}", self.id, message);
                if let Some(player) = self.player.as_mut() {
                    player.show_notice(&format!("Error: {}", message));
                }
                self.deps
                    .event_bus
                    .emit(PlaybackErrorReported::new(self.id, message, None));
            }
            PlayerEvent::Ready | PlayerEvent::Destroy => {}
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => debug!("session {}: streaming engine ready", self.id),
            EngineEvent::Error {
                message,
                fatal,
                reconnect_attempt,
            } => {
                warn!(
                    "session {}: streaming error (fatal: {}, reconnect attempt {}): {}",
                    self.id, fatal, reconnect_attempt, message
                );
                if let Some(player) = self.player.as_mut() {
                    player.show_notice(&format!("Error: {}", message));
                }
                self.deps.event_bus.emit(PlaybackErrorReported::new(
                    self.id,
                    message,
                    Some(reconnect_attempt),
                ));
            }
        }
    }

    /// Size the subtitles and pick the resume target, if any
    fn on_ready(&mut self) -> Option<f64> {
        let player = self.player.as_mut()?;
        let duration = player.duration();
        info!("session {}: player ready (duration {:.1}s)", self.id, duration);
        player.set_subtitle_font_size(font_size_for_height(player.height()));
        self.sync.take_resume_point(duration)
    }

    fn apply_resume(&mut self, target: f64) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.seek(target);
        player.show_notice(&format!("Continuando desde {}", format_timestamp(target)));
        info!("session {}: resumed at {:.1}s", self.id, target);
        self.deps.event_bus.emit(ResumeApplied::new(
            self.id,
            self.request.episode.episode_id.clone(),
            target,
        ));
    }

    fn on_time_update(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if player.is_loading() {
            return;
        }

        let (current, duration) = (player.current_time(), player.duration());
        let decision = self.skip.classify(current, duration);

        if self.last_affordance != Some(decision.affordance) {
            player.update_skip_control(&decision.affordance);
            self.last_affordance = Some(decision.affordance);
        }

        if let Some(seek) = decision.seek {
            self.perform_skip(seek, current, true);
        }

        self.sync.on_time_update(current, duration);
    }

    fn on_manual_skip(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let (current, duration) = (player.current_time(), player.duration());

        let Some(seek) = self.skip.activate_manual(current, duration) else {
            debug!("session {}: manual skip outside of any region", self.id);
            return;
        };

        self.perform_skip(seek, current, false);

        let hidden = SkipAffordanceState::hidden();
        if let Some(player) = self.player.as_mut() {
            player.update_skip_control(&hidden);
        }
        self.last_affordance = Some(hidden);
    }

    fn perform_skip(&mut self, seek: SeekInstruction, from: f64, automatic: bool) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.seek(seek.target);
        if let Some(notice) = seek.notice {
            player.show_notice(notice);
        }
        info!(
            "session {}: skipped {} from {:.1}s to {:.1}s",
            self.id, seek.region, from, seek.target
        );
        self.deps.event_bus.emit(SkipPerformed::new(
            self.id,
            seek.region,
            from,
            seek.target,
            automatic,
        ));
    }

    /// Release everything in order while the player can still report time
    fn teardown(&mut self) {
        let (current, duration) = self
            .player
            .as_ref()
            .map(|player| (player.current_time(), player.duration()))
            .unwrap_or((0.0, 0.0));

        if let Some(engine) = self.engine.as_mut() {
            engine.stop_load();
        }
        self.sync.on_teardown(current, duration);
        self.release_resources();
    }

    fn release_resources(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        if let Some(mut player) = self.player.take() {
            player.pause();
            player.destroy();
        }
    }

    /// Publish TornDown. A session that never built a player still waits
    /// for its predecessor, so the chain of releases stays ordered.
    async fn finish(&mut self) {
        wait_for_release(self.previous.take()).await;
        self.set_phase(SessionPhase::TornDown);
        self.deps.event_bus.emit(SessionTornDown::new(
            self.id,
            self.request.episode.episode_id.clone(),
        ));
        info!("session {} torn down", self.id);
    }

    fn set_phase(&self, phase: SessionPhase) {
        debug!("session {} -> {}", self.id, phase);
        self.phase.send_replace(phase);
    }
}

/// Next event from an optional subscription; pends forever without one
async fn next_event<T>(events: &mut Option<UnboundedReceiver<T>>) -> Option<T> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn resume_due(pending: &mut Option<PendingResume>) -> f64 {
    let Some(resume) = *pending else {
        return std::future::pending().await;
    };
    tokio::time::sleep_until(resume.deadline).await;
    *pending = None;
    resume.target
}

/// Resolves once the previous session is gone (or there is none)
async fn wait_for_release(previous: Option<watch::Receiver<SessionPhase>>) {
    if let Some(mut phase) = previous {
        // A closed channel means the task already ended
        let _ = phase.wait_for(|phase| phase.is_terminal()).await;
    }
}

/// `m:ss`
fn format_timestamp(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
