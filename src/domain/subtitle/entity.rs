use serde::{Deserialize, Serialize};

use crate::domain::session::AudioMode;

/// A subtitle track offered upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
}

/// A track as presented in the player's subtitle selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleOption {
    pub label: String,
    pub url: String,
    pub default: bool,
}

/// Initial subtitle state handed to the player at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleSetup {
    /// Track loaded at start (`None` in dub mode or when no Spanish track exists)
    pub initial_url: Option<String>,
    pub visible: bool,
    pub options: Vec<SubtitleOption>,
}

/// Languages whose labels are shown in Spanish
const LOCALIZED_LABELS: &[(&str, &str)] = &[
    ("English", "Inglés"),
    ("Spanish", "Español"),
    ("Español", "Español"),
    ("French", "Francés"),
    ("German", "Alemán"),
    ("Japanese", "Japonés"),
    ("Portuguese", "Portugués"),
];

/// Label for a track language; unknown languages keep their upstream name
pub fn localized_label(lang: &str) -> &str {
    LOCALIZED_LABELS
        .iter()
        .find(|(upstream, _)| *upstream == lang)
        .map(|(_, label)| *label)
        .unwrap_or(lang)
}

fn is_spanish(lang: &str) -> bool {
    lang == "Español" || lang == "Spanish"
}

impl SubtitleSetup {
    /// Sub mode starts on the Spanish track with subtitles shown; dub mode
    /// starts with subtitles hidden and nothing loaded.
    pub fn for_mode(tracks: &[SubtitleTrack], mode: AudioMode) -> Self {
        let options = tracks
            .iter()
            .map(|track| SubtitleOption {
                label: localized_label(&track.lang).to_string(),
                url: track.url.clone(),
                default: track.lang == "Español",
            })
            .collect();

        let initial_url = match mode {
            AudioMode::Sub => tracks
                .iter()
                .find(|track| is_spanish(&track.lang))
                .map(|track| track.url.clone()),
            AudioMode::Dub => None,
        };

        Self {
            initial_url,
            visible: mode == AudioMode::Sub,
            options,
        }
    }
}

/// Subtitle font size for a given player height
pub fn font_size_for_height(height: f64) -> f64 {
    height * 0.04
}

/// Font size after a resize, kept readable on tiny and huge players
pub fn clamped_font_size_for_height(height: f64) -> f64 {
    font_size_for_height(height).clamp(14.0, 32.0)
}
