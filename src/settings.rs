//! Run settings and difficulty presets
//!
//! Loaded from JSON; any field left out falls back to its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TrackError;
use crate::sim::player::ControlScheme;
use crate::sim::segment::SegmentTemplate;
use crate::sim::selector::{
    AllowedZones, ContentCatalog, ContentSelector, SpawnChances, SpawnContent,
};
use crate::sim::speed::SpeedCurve;
use crate::sim::streamer::PoolingStrategy;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Per-slot obstacle chance for this preset
    pub fn obstacle_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Normal => 0.5,
            Difficulty::Hard => 0.7,
        }
    }

    /// Per-slot pickup chance for this preset
    pub fn pickup_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Normal => 0.3,
            Difficulty::Hard => 0.2,
        }
    }

    /// Multiplier on base and max speed
    pub fn speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.25,
        }
    }
}

/// Segment window and pooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    /// Forward length of one segment
    pub track_length: f32,
    /// Track must extend at least this far past the player
    pub spawn_distance_ahead: f32,
    /// Segments further than this behind the player are recycled
    pub despawn_behind_distance: f32,
    /// Segments laid down at initialize
    pub initial_track_count: usize,
    pub pooling: PoolingStrategy,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            track_length: TRACK_LENGTH,
            spawn_distance_ahead: SPAWN_DISTANCE_AHEAD,
            despawn_behind_distance: DESPAWN_BEHIND_DISTANCE,
            initial_track_count: INITIAL_TRACK_COUNT,
            pooling: PoolingStrategy::RecycleInPlace,
        }
    }
}

impl TrackSettings {
    pub fn validate(&self) -> Result<(), TrackError> {
        if !(self.track_length.is_finite() && self.track_length >= MIN_TRACK_LENGTH) {
            return Err(TrackError::invalid(
                "track_length",
                format!("must be at least {MIN_TRACK_LENGTH}, got {}", self.track_length),
            ));
        }
        non_negative("spawn_distance_ahead", self.spawn_distance_ahead)?;
        non_negative("despawn_behind_distance", self.despawn_behind_distance)?;

        let window = (self.spawn_distance_ahead + self.despawn_behind_distance) / self.track_length;
        if !(window <= MAX_WINDOW_SEGMENTS as f32) {
            return Err(TrackError::invalid(
                "spawn_distance_ahead",
                format!(
                    "window spans {window:.0} segments, limit is {MAX_WINDOW_SEGMENTS}"
                ),
            ));
        }
        if self.initial_track_count > MAX_WINDOW_SEGMENTS {
            return Err(TrackError::invalid(
                "initial_track_count",
                format!(
                    "{} exceeds limit of {MAX_WINDOW_SEGMENTS}",
                    self.initial_track_count
                ),
            ));
        }
        Ok(())
    }
}

/// Content placement chances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub obstacle_chance: f32,
    pub pickup_chance: f32,
    /// Lateral offset beyond which a slot is left/right rather than center
    pub position_threshold: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            obstacle_chance: Difficulty::Normal.obstacle_chance(),
            pickup_chance: Difficulty::Normal.pickup_chance(),
            position_threshold: POSITION_THRESHOLD,
        }
    }
}

impl SpawnSettings {
    pub fn chances(&self) -> SpawnChances {
        SpawnChances::new(self.obstacle_chance, self.pickup_chance)
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        probability("obstacle_chance", self.obstacle_chance)?;
        probability("pickup_chance", self.pickup_chance)?;
        non_negative("position_threshold", self.position_threshold)
    }
}

/// Forward speed ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    pub base_speed: f32,
    pub max_speed: f32,
    pub ramp_seconds: f32,
    pub curve: SpeedCurve,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            base_speed: BASE_SPEED,
            max_speed: MAX_SPEED,
            ramp_seconds: SPEED_RAMP_SECONDS,
            curve: SpeedCurve::Linear,
        }
    }
}

impl SpeedSettings {
    pub fn validate(&self) -> Result<(), TrackError> {
        non_negative("base_speed", self.base_speed)?;
        if !(self.max_speed >= self.base_speed) {
            return Err(TrackError::invalid(
                "max_speed",
                format!("{} is below base_speed {}", self.max_speed, self.base_speed),
            ));
        }
        if !(self.ramp_seconds > 0.0) {
            return Err(TrackError::invalid("ramp_seconds", "must be positive"));
        }
        Ok(())
    }
}

/// Player steering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub scheme: ControlScheme,
    /// Sideways speed (units/s)
    pub lateral_speed: f32,
    /// Lean below this angle is ignored
    pub lean_deadzone_degrees: f32,
    /// Lean at or past this angle reaches the track edge
    pub lean_max_degrees: f32,
    /// Half of the drivable track width
    pub half_width: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            scheme: ControlScheme::Keyboard,
            lateral_speed: 8.0,
            lean_deadzone_degrees: 4.0,
            lean_max_degrees: 30.0,
            half_width: LANE_WIDTH * 1.5,
        }
    }
}

impl ControlSettings {
    pub fn validate(&self) -> Result<(), TrackError> {
        non_negative("lateral_speed", self.lateral_speed)?;
        non_negative("half_width", self.half_width)?;
        non_negative("lean_deadzone_degrees", self.lean_deadzone_degrees)?;
        if !(self.lean_max_degrees > self.lean_deadzone_degrees) {
            return Err(TrackError::invalid(
                "lean_max_degrees",
                "must exceed lean_deadzone_degrees",
            ));
        }
        Ok(())
    }
}

/// Score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Points per world unit travelled
    pub points_per_unit: f32,
    /// Points per collected pickup
    pub pickup_value: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_unit: 1.0,
            pickup_value: 50,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub track: TrackSettings,
    pub spawn: SpawnSettings,
    pub speed: SpeedSettings,
    pub control: ControlSettings,
    pub scoring: ScoringSettings,
    pub obstacles: ContentCatalog,
    pub pickups: ContentCatalog,
    /// Segment layout; `null` leaves the streamer without a template
    pub template: Option<SegmentTemplate>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            track: TrackSettings::default(),
            spawn: SpawnSettings::default(),
            speed: SpeedSettings::default(),
            control: ControlSettings::default(),
            scoring: ScoringSettings::default(),
            obstacles: ContentCatalog::new()
                .with("barrier", AllowedZones::All)
                .with("hurdle", AllowedZones::All)
                .with("wall_left", AllowedZones::LeftOnly)
                .with("wall_right", AllowedZones::RightOnly)
                .with("train", AllowedZones::LeftAndRight),
            pickups: ContentCatalog::new()
                .with("coin", AllowedZones::All)
                .with("magnet", AllowedZones::CenterOnly)
                .with("shield", AllowedZones::LeftAndRight),
            template: Some(SegmentTemplate::lanes(TRACK_LENGTH, LANE_WIDTH)),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates chances and speeds)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.spawn.obstacle_chance = preset.obstacle_chance();
        self.spawn.pickup_chance = preset.pickup_chance();

        let defaults = SpeedSettings::default();
        self.speed.base_speed = defaults.base_speed * preset.speed_scale();
        self.speed.max_speed = defaults.max_speed * preset.speed_scale();
    }

    /// Catalogs, chances and selector for the streamer
    pub fn spawn_content(&self) -> SpawnContent {
        SpawnContent {
            obstacles: self.obstacles.clone(),
            pickups: self.pickups.clone(),
            chances: self.spawn.chances(),
            selector: ContentSelector::new(self.spawn.position_threshold),
        }
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        self.track.validate()?;
        self.spawn.validate()?;
        self.speed.validate()?;
        self.control.validate()?;
        if self.obstacles.is_empty() && self.pickups.is_empty() {
            log::warn!("Both content catalogs are empty; track will be bare");
        }
        Ok(())
    }

    /// Parse and validate settings
    ///
    /// The `difficulty` preset fills in chances and speeds; any of those
    /// given explicitly in the document win over the preset.
    pub fn from_json(json: &str) -> Result<Self, TrackError> {
        let doc: serde_json::Value = serde_json::from_str(json)?;
        let mut settings = Self::deserialize(&doc)?;
        settings.fill_from_preset(&doc);
        settings.validate()?;
        Ok(settings)
    }

    fn fill_from_preset(&mut self, doc: &serde_json::Value) {
        let preset = self.difficulty;
        let given = |pointer: &str| doc.pointer(pointer).is_some();
        let scaled = SpeedSettings::default();

        if !given("/spawn/obstacle_chance") {
            self.spawn.obstacle_chance = preset.obstacle_chance();
        }
        if !given("/spawn/pickup_chance") {
            self.spawn.pickup_chance = preset.pickup_chance();
        }
        if !given("/speed/base_speed") {
            self.speed.base_speed = scaled.base_speed * preset.speed_scale();
        }
        if !given("/speed/max_speed") {
            self.speed.max_speed = scaled.max_speed * preset.speed_scale();
        }
    }

    pub fn to_json(&self) -> Result<String, TrackError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TrackError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), TrackError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrackError::invalid(name, format!("must be >= 0, got {value}")))
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), TrackError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TrackError::invalid(name, format!("must be in [0, 1], got {value}")))
    }
}
