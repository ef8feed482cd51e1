// src/services/skip_engine.rs
//
// Skip Region Engine
//
// Holds the intro/outro regions of one episode and the viewer's auto-skip
// preference, and turns every time tick into a skip decision.
//
// RULES:
// - Automatic mode seeks once per entry into a region and never shows the
//   button
// - Manual mode never seeks on its own
// - Intro wins when both regions contain the playhead

use log::debug;

use crate::domain::{
    affordance_for, EpisodeSource, Highlight, SkipAffordanceState, SkipKind, SkipMode, SkipRegion,
};

/// A seek the player must perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekInstruction {
    pub target: f64,
    pub region: SkipKind,
    /// Transient notice to show alongside the seek
    pub notice: Option<&'static str>,
}

/// Outcome of one time tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipDecision {
    pub affordance: SkipAffordanceState,
    pub seek: Option<SeekInstruction>,
}

#[derive(Debug, Clone)]
pub struct SkipEngine {
    intro: SkipRegion,
    outro: SkipRegion,
    auto_skip: bool,
    end_margin: f64,
    /// Region containing the playhead on the previous tick
    last_region: Option<SkipKind>,
    /// Region the viewer already skipped manually; button stays hidden in it
    dismissed: Option<SkipKind>,
}

impl SkipEngine {
    pub fn new(intro: SkipRegion, outro: SkipRegion, auto_skip: bool, end_margin: f64) -> Self {
        Self {
            intro,
            outro,
            auto_skip,
            end_margin,
            last_region: None,
            dismissed: None,
        }
    }

    pub fn from_episode(episode: &EpisodeSource, auto_skip: bool, end_margin: f64) -> Self {
        Self::new(
            episode.intro_region(),
            episode.outro_region(),
            auto_skip,
            end_margin,
        )
    }

    pub fn auto_skip(&self) -> bool {
        self.auto_skip
    }

    /// Switch mode. Entry tracking restarts, so turning auto-skip on inside a
    /// region skips it on the next tick.
    pub fn set_auto_skip(&mut self, enabled: bool) {
        self.auto_skip = enabled;
        self.last_region = None;
        self.dismissed = None;
    }

    pub fn intro(&self) -> &SkipRegion {
        &self.intro
    }

    pub fn outro(&self) -> &SkipRegion {
        &self.outro
    }

    /// The valid region containing `current`, intro first
    pub fn containing_region(&self, current: f64, duration: f64) -> Option<SkipRegion> {
        [self.intro, self.outro]
            .into_iter()
            .find(|region| region.contains(current, duration))
    }

    pub fn classify(&mut self, current: f64, duration: f64) -> SkipDecision {
        let inside = self.containing_region(current, duration);
        let kind = inside.map(|region| region.kind);
        let entered = kind.is_some() && kind != self.last_region;

        self.last_region = kind;
        if self.dismissed != kind {
            self.dismissed = None;
        }

        if self.auto_skip {
            let seek = match inside {
                Some(region) if entered => self.seek_for(&region, duration, true),
                _ => None,
            };
            return SkipDecision {
                affordance: affordance_for(SkipMode::Automatic, inside),
                seek,
            };
        }

        let affordance = if kind.is_some() && self.dismissed == kind {
            // Same shape as automatic mode: region known, button hidden
            affordance_for(SkipMode::Automatic, inside)
        } else {
            affordance_for(SkipMode::Manual, inside)
        };

        SkipDecision {
            affordance,
            seek: None,
        }
    }

    /// Viewer pressed the skip button.
    ///
    /// Only honoured in manual mode while a region contains the playhead.
    /// The button stays hidden until playback leaves that region.
    pub fn activate_manual(&mut self, current: f64, duration: f64) -> Option<SeekInstruction> {
        if self.auto_skip {
            return None;
        }
        let region = self.containing_region(current, duration)?;
        if self.dismissed == Some(region.kind) {
            return None;
        }

        self.dismissed = Some(region.kind);
        self.last_region = Some(region.kind);
        self.seek_for(&region, duration, false)
    }

    /// Progress-bar markers for both regions
    pub fn highlights(&self) -> Vec<Highlight> {
        let mut markers = self.intro.highlights();
        markers.extend(self.outro.highlights());
        markers
    }

    fn seek_for(
        &self,
        region: &SkipRegion,
        duration: f64,
        automatic: bool,
    ) -> Option<SeekInstruction> {
        let target = region.seek_target(duration, self.end_margin)?;
        debug!(
            "{} skip of {} to {:.1}s",
            if automatic { "automatic" } else { "manual" },
            region.kind,
            target
        );
        Some(SeekInstruction {
            target,
            region: region.kind,
            notice: automatic.then(|| region.kind.auto_skip_notice()),
        })
    }
}
