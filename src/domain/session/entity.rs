use serde::{Deserialize, Serialize};

use crate::domain::source::{EpisodeSource, PlaybackSource, SkipWindow};
use crate::domain::subtitle::SubtitleTrack;

/// Audio flavour of the episode being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    Sub,
    Dub,
}

/// Whether the viewer is signed in to the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    Anonymous,
    Authenticated,
}

/// Anime metadata forwarded to the bookmark call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeInfo {
    pub id: String,
    pub title: String,
    pub image: String,
}

/// The episode being played, as identified by the servers API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub episode_id: String,
    /// Episode number as upstream sends it ("12", "12-13", ...)
    pub episode_no: String,
}

impl EpisodeRef {
    pub fn new(episode_id: impl Into<String>, episode_no: impl Into<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            episode_no: episode_no.into(),
        }
    }

    /// Leading integer of `episode_no`, if any
    pub fn number(&self) -> Option<u32> {
        let digits: String = self
            .episode_no
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// Lifecycle of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    /// Waiting on the bookmark lookup and on the previous session's teardown
    Resolving,
    /// No player could be built; the host shows a loading placeholder
    Placeholder,
    Active,
    TornDown,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::TornDown)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Resolving => "resolving",
            SessionPhase::Placeholder => "placeholder",
            SessionPhase::Active => "active",
            SessionPhase::TornDown => "torn_down",
        };
        f.write_str(name)
    }
}

/// Everything whose change requires a brand new session.
///
/// Skip windows and subtitle tracks are part of it: upstream may refresh
/// them for the same stream, and a running session never re-reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub anime_id: String,
    pub episode_id: String,
    pub mode: AudioMode,
    pub auto_skip_default: bool,
    pub resolved_uri: Option<String>,
    pub intro: Option<SkipWindow>,
    pub outro: Option<SkipWindow>,
    pub tracks: Vec<SubtitleTrack>,
}

impl SessionIdentity {
    pub fn new(
        anime: &AnimeInfo,
        episode: &EpisodeRef,
        mode: AudioMode,
        auto_skip_default: bool,
        upstream: &EpisodeSource,
        source: Option<&PlaybackSource>,
    ) -> Self {
        Self {
            anime_id: anime.id.clone(),
            episode_id: episode.episode_id.clone(),
            mode,
            auto_skip_default,
            resolved_uri: source.map(|s| s.resolved_uri.clone()),
            intro: upstream.intro,
            outro: upstream.outro,
            tracks: upstream.tracks.clone(),
        }
    }
}
