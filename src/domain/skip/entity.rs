use serde::{Deserialize, Serialize};

use super::invariants::validate_skip_bounds;

/// Which part of the episode a skip region covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    Intro,
    Outro,
}

impl SkipKind {
    /// Name shown on the manual skip button and on progress-bar markers
    pub fn label(&self) -> &'static str {
        match self {
            SkipKind::Intro => "Intro",
            SkipKind::Outro => "Outro",
        }
    }

    /// Notice shown after an automatic skip
    pub fn auto_skip_notice(&self) -> &'static str {
        match self {
            SkipKind::Intro => "Intro saltada automáticamente",
            SkipKind::Outro => "Outro saltado automáticamente",
        }
    }

    pub fn button_label(&self) -> String {
        format!("Saltar {}", self.label())
    }
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

/// End boundary of a skip region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionEnd {
    /// Fixed end, in seconds
    At { seconds: f64 },
    /// Outro delivered with `end == 0`: runs until the end of the media
    EndOfMedia,
}

/// A time interval the viewer may skip
///
/// `valid` is computed once at construction. An invalid region never
/// contains any instant and never produces a seek.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipRegion {
    pub kind: SkipKind,
    pub start: f64,
    pub end: RegionEnd,
    pub valid: bool,
}

/// A single progress-bar marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub time: u64,
    pub text: String,
}

impl SkipRegion {
    /// Build a region from the raw upstream bounds.
    ///
    /// Both bounds must be present and finite. An outro whose end is exactly
    /// zero and whose start is positive is open-ended; every other region
    /// requires `start < end`.
    pub fn new(kind: SkipKind, start: Option<f64>, end: Option<f64>) -> Self {
        let (Some(start), Some(end)) = (start, end) else {
            return Self::invalid(kind);
        };

        if kind == SkipKind::Outro && end == 0.0 && start.is_finite() && start > 0.0 {
            return Self {
                kind,
                start,
                end: RegionEnd::EndOfMedia,
                valid: true,
            };
        }

        Self {
            kind,
            start,
            end: RegionEnd::At { seconds: end },
            valid: validate_skip_bounds(start, end).is_ok(),
        }
    }

    /// A region that never triggers
    pub fn invalid(kind: SkipKind) -> Self {
        Self {
            kind,
            start: 0.0,
            end: RegionEnd::At { seconds: 0.0 },
            valid: false,
        }
    }

    /// End of the region once `duration` is known.
    ///
    /// Open-ended outros have no effective end until the duration is a
    /// positive finite number.
    pub fn effective_end(&self, duration: f64) -> Option<f64> {
        if !self.valid {
            return None;
        }
        match self.end {
            RegionEnd::At { seconds } => Some(seconds),
            RegionEnd::EndOfMedia if duration.is_finite() && duration > 0.0 => Some(duration),
            RegionEnd::EndOfMedia => None,
        }
    }

    /// `current ∈ [start, effective_end)`
    pub fn contains(&self, current: f64, duration: f64) -> bool {
        match self.effective_end(duration) {
            Some(end) => current >= self.start && current < end,
            None => false,
        }
    }

    /// Where a skip of this region lands.
    ///
    /// The target is clamped to the duration; landing exactly on the end of
    /// the media would fire the player's ended state, so a target at (or past)
    /// the duration is pulled back by `end_margin`.
    pub fn seek_target(&self, duration: f64, end_margin: f64) -> Option<f64> {
        let end = self.effective_end(duration)?;
        if duration.is_finite() && duration > 0.0 && end >= duration {
            return Some((duration - end_margin).max(0.0));
        }
        Some(end)
    }

    /// One marker per whole second of a bounded region
    pub fn highlights(&self) -> Vec<Highlight> {
        let RegionEnd::At { seconds: end } = self.end else {
            return Vec::new();
        };
        if !self.valid {
            return Vec::new();
        }

        let first = self.start.floor().max(0.0) as u64;
        let last = end.floor() as u64;
        (first..=last)
            .map(|time| Highlight {
                time,
                text: self.kind.label().to_string(),
            })
            .collect()
    }
}
