pub mod affordance;
pub mod entity;
pub mod invariants;

pub use affordance::{affordance_for, SkipAffordanceState, SkipMode};
pub use entity::{Highlight, RegionEnd, SkipKind, SkipRegion};
pub use invariants::validate_skip_bounds;
