use serde::{Deserialize, Serialize};

use super::entity::{SkipKind, SkipRegion};

/// How the viewer wants skip regions handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMode {
    /// Seek past the region as soon as playback enters it
    Automatic,
    /// Offer a skip button and wait for the viewer
    Manual,
}

impl SkipMode {
    pub fn from_auto_skip(enabled: bool) -> Self {
        if enabled {
            SkipMode::Automatic
        } else {
            SkipMode::Manual
        }
    }
}

/// What the skip control should look like for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipAffordanceState {
    pub inside_region: Option<SkipRegion>,
    pub manual_button_visible: bool,
    pub label: Option<SkipKind>,
}

impl SkipAffordanceState {
    pub fn hidden() -> Self {
        Self {
            inside_region: None,
            manual_button_visible: false,
            label: None,
        }
    }

    pub fn button_text(&self) -> Option<String> {
        self.label.map(|kind| kind.button_label())
    }
}

/// Pure mapping from (mode, containing region) to the control state.
///
/// Automatic mode never shows the button. Manual mode shows it, labelled,
/// only while a region contains the playhead.
pub fn affordance_for(mode: SkipMode, inside: Option<SkipRegion>) -> SkipAffordanceState {
    match (mode, inside) {
        (SkipMode::Manual, Some(region)) => SkipAffordanceState {
            inside_region: Some(region),
            manual_button_visible: true,
            label: Some(region.kind),
        },
        (_, inside) => SkipAffordanceState {
            inside_region: inside,
            manual_button_visible: false,
            label: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intro() -> SkipRegion {
        SkipRegion::new(SkipKind::Intro, Some(0.0), Some(85.0))
    }

    #[test]
    fn test_automatic_mode_never_shows_button() {
        let state = affordance_for(SkipMode::Automatic, Some(intro()));
        assert!(!state.manual_button_visible);
        assert_eq!(state.label, None);
        assert_eq!(state.inside_region, Some(intro()));
    }

    #[test]
    fn test_manual_mode_inside_region_shows_labelled_button() {
        let state = affordance_for(SkipMode::Manual, Some(intro()));
        assert!(state.manual_button_visible);
        assert_eq!(state.button_text().as_deref(), Some("Saltar Intro"));
    }

    #[test]
    fn test_outside_regions_is_hidden() {
        assert_eq!(
            affordance_for(SkipMode::Manual, None),
            SkipAffordanceState::hidden()
        );
    }
}
