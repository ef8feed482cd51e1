use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::skip::{SkipKind, SkipRegion};
use crate::domain::subtitle::SubtitleTrack;

/// One upstream stream as returned by the episode sources API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    pub url: String,
    #[serde(default, rename = "isM3U8")]
    pub is_m3u8: bool,
    #[serde(default)]
    pub quality: Option<String>,
}

/// Raw skip bounds as delivered upstream (either side may be missing)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkipWindow {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

/// Everything upstream knows about how to play one episode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodeSource {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub tracks: Vec<SubtitleTrack>,
    #[serde(default)]
    pub intro: Option<SkipWindow>,
    #[serde(default)]
    pub outro: Option<SkipWindow>,
}

impl EpisodeSource {
    pub fn intro_region(&self) -> SkipRegion {
        region_from(SkipKind::Intro, self.intro)
    }

    pub fn outro_region(&self) -> SkipRegion {
        region_from(SkipKind::Outro, self.outro)
    }
}

fn region_from(kind: SkipKind, window: Option<SkipWindow>) -> SkipRegion {
    match window {
        Some(window) => SkipRegion::new(kind, window.start, window.end),
        None => SkipRegion::invalid(kind),
    }
}

/// A source the player can open, routed through the stream proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSource {
    pub primary_url: String,
    pub referer: String,
    pub resolved_uri: String,
}
