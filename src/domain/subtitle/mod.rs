pub mod entity;

pub use entity::{
    clamped_font_size_for_height, font_size_for_height, localized_label, SubtitleOption,
    SubtitleSetup, SubtitleTrack,
};
