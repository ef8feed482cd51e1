// src/integrations/mod.rs
//
// External Integrations Module
//
// Contracts for the collaborators a playback session drives but does not own
// the implementation of.

pub mod player;

pub use player::{
    EngineConfig, EngineEvent, HlsSupport, MediaTarget, PlaybackBackend, Player, PlayerEvent,
    PlayerOptions, StreamingEngine,
};
