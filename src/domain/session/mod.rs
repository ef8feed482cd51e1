pub mod entity;

pub use entity::{AnimeInfo, AudioMode, EpisodeRef, SessionIdentity, SessionPhase, Viewer};
