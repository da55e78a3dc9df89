pub mod config;
pub mod export;
pub mod library;
pub mod mix;
pub mod neighbors;
pub mod presets;
pub mod scoring;
pub mod sequence;
pub mod track;
pub mod transitions;

pub use mix::{MixRequest, build_mix};
pub use track::{CamelotKey, TrackFeature};
pub use transitions::{PlaylistItem, TransitionPlan};

/// Application name for XDG paths
pub const APP_NAME: &str = "setmix";
