// src/services/session_manager.rs
//
// Session Lifecycle Manager
//
// Keeps at most one live playback session bound to the rendering surface.
//
// CRITICAL RULES:
// - Mounting an unchanged identity is a no-op
// - Any identity change retires the old session (generation bump first,
//   then the teardown command) and spawns a fresh one
// - The new session is handed the old one's phase so it can wait for the
//   player to be released before building its own
// - Must be called from inside a tokio runtime

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::domain::{SessionIdentity, SessionPhase};
use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::integrations::PlaybackBackend;
use crate::repositories::RecordStore;
use crate::services::liveness::GenerationCounter;
use crate::services::playback_session::{
    MountRequest, PlaybackSession, SessionCommand, SessionDeps, SessionHandle,
};
use crate::services::source_resolver::SourceResolver;

pub struct SessionManager {
    deps: SessionDeps,
    resolver: SourceResolver,
    generations: GenerationCounter,
    current: Mutex<Option<SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn PlaybackBackend>,
        store: Arc<dyn RecordStore>,
        event_bus: Arc<EventBus>,
        config: ControllerConfig,
    ) -> Self {
        let resolver = SourceResolver::new(config.proxy_base_url.clone());
        Self {
            deps: SessionDeps {
                backend,
                store,
                event_bus,
                config: Arc::new(config),
                tasks: TaskTracker::new(),
            },
            resolver,
            generations: GenerationCounter::new(),
            current: Mutex::new(None),
        }
    }

    /// Mount (or keep) the session for `request` and return its id
    pub fn mount(&self, request: MountRequest) -> Uuid {
        let source = self.resolver.resolve_episode(&request.source);
        let identity = SessionIdentity::new(
            &request.anime,
            &request.episode,
            request.mode,
            request.auto_skip,
            &request.source,
            source.as_ref(),
        );

        let mut current = self.current.lock();

        if let Some(handle) = current.as_ref() {
            if handle.identity == identity && !handle.phase().is_terminal() {
                debug!("session {} already mounted for this identity", handle.id);
                return handle.id;
            }
        }

        let liveness = self.generations.advance();
        let previous = current.take().map(|old| {
            info!("replacing session {}", old.id);
            old.send(SessionCommand::Teardown);
            old.watch_phase()
        });

        let (session, handle, commands) =
            PlaybackSession::new(request, source, self.deps.clone(), liveness, previous);
        let id = handle.id;

        self.deps.tasks.spawn(session.run(commands));
        *current = Some(handle);

        info!(
            "mounted session {} for episode {}",
            id, identity.episode_id
        );
        id
    }

    /// Tear down the current session, if any
    pub fn unmount(&self) {
        let Some(handle) = self.current.lock().take() else {
            return;
        };
        self.generations.invalidate();
        handle.send(SessionCommand::Teardown);
        info!("unmounted session {}", handle.id);
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current.lock().as_ref().map(|handle| handle.id)
    }

    pub fn current_identity(&self) -> Option<SessionIdentity> {
        self.current.lock().as_ref().map(|handle| handle.identity.clone())
    }

    pub fn current_phase(&self) -> Option<SessionPhase> {
        self.current.lock().as_ref().map(|handle| handle.phase())
    }

    /// Phase updates of the current session
    pub fn watch_phase(&self) -> Option<watch::Receiver<SessionPhase>> {
        self.current.lock().as_ref().map(|handle| handle.watch_phase())
    }

    pub fn set_auto_skip(&self, enabled: bool) -> AppResult<()> {
        self.send(SessionCommand::SetAutoSkip(enabled))
    }

    pub fn manual_skip(&self) -> AppResult<()> {
        self.send(SessionCommand::ManualSkip)
    }

    pub fn show_subtitles(&self, visible: bool) -> AppResult<()> {
        self.send(SessionCommand::ShowSubtitles(visible))
    }

    pub fn select_subtitle(&self, url: impl Into<String>, name: impl Into<String>) -> AppResult<()> {
        self.send(SessionCommand::SelectSubtitle {
            url: url.into(),
            name: name.into(),
        })
    }

    /// Tear down the current session and wait for every session task and
    /// in-flight progress write to finish
    pub async fn shutdown(&self) {
        self.unmount();
        self.deps.tasks.close();
        self.deps.tasks.wait().await;
        self.deps.tasks.reopen();
        debug!("session manager drained");
    }

    fn send(&self, command: SessionCommand) -> AppResult<()> {
        let current = self.current.lock();
        let handle = current.as_ref().ok_or(AppError::NotFound)?;
        if handle.send(command) {
            Ok(())
        } else {
            Err(AppError::Other(format!("session {} has ended", handle.id)))
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.unmount();
    }
}
