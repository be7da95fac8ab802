//! Endless Runner - track streaming and content placement
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track streaming, content selection, player control)
//! - `settings`: Data-driven track, spawn and speed tuning
//! - `score`: Run scoring and leaderboard
//! - `error`: Configuration error taxonomy

pub mod error;
pub mod score;
pub mod settings;
pub mod sim;

pub use error::TrackError;
pub use score::{HighScores, ScoreCounter};
pub use settings::{Difficulty, Settings};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz is plenty for scrolling track)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Track defaults (world units)
    pub const TRACK_LENGTH: f32 = 10.0;
    pub const SPAWN_DISTANCE_AHEAD: f32 = 60.0;
    pub const DESPAWN_BEHIND_DISTANCE: f32 = 20.0;
    pub const INITIAL_TRACK_COUNT: usize = 5;
    /// Shortest segment the streamer accepts
    pub const MIN_TRACK_LENGTH: f32 = 0.01;
    /// Most segments the window may span, and most placed in one pass
    pub const MAX_WINDOW_SEGMENTS: usize = 1024;

    /// Lateral offset beyond which a slot counts as left/right
    pub const POSITION_THRESHOLD: f32 = 0.5;
    /// Lane spacing of the default segment template
    pub const LANE_WIDTH: f32 = 2.0;

    /// Forward speed defaults (units per second)
    pub const BASE_SPEED: f32 = 12.0;
    pub const MAX_SPEED: f32 = 30.0;
    /// Seconds to ramp from base to max speed
    pub const SPEED_RAMP_SECONDS: f32 = 120.0;

    /// Guard for the obstacle/pickup apportionment denominator
    pub const PROBABILITY_EPSILON: f32 = 1e-6;
    /// Parent scale components below this are treated as unit scale
    pub const SCALE_EPSILON: f32 = 1e-5;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep on [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
