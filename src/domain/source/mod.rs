pub mod entity;

pub use entity::{EpisodeSource, PlaybackSource, SkipWindow, SourceEntry};
