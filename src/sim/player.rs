//! Player lateral control
//!
//! Two schemes: a keyboard axis that slides the runner sideways at a fixed
//! rate, and a motion-sensor lean that maps tilt to a target lateral position.

use serde::{Deserialize, Serialize};

use crate::settings::ControlSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlScheme {
    #[default]
    Keyboard,
    Lean,
}

impl ControlScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::Keyboard => "Keyboard",
            ControlScheme::Lean => "Lean",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "keyboard" | "keys" => Some(ControlScheme::Keyboard),
            "lean" | "tilt" | "motion" => Some(ControlScheme::Lean),
            _ => None,
        }
    }
}

/// Map a lean angle to a lateral position in [-half_width, half_width]
pub fn lean_to_lateral(lean_degrees: f32, settings: &ControlSettings) -> f32 {
    let magnitude = lean_degrees.abs();
    if !magnitude.is_finite() || magnitude <= settings.lean_deadzone_degrees {
        return 0.0;
    }
    let span = (settings.lean_max_degrees - settings.lean_deadzone_degrees).max(f32::EPSILON);
    let t = ((magnitude - settings.lean_deadzone_degrees) / span).clamp(0.0, 1.0);
    lean_degrees.signum() * t * settings.half_width
}

/// The runner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    /// Sideways offset from the track centerline
    pub lateral: f32,
    /// Forward position
    pub z: f32,
    /// Lateral velocity of the last steer step (units/s)
    pub lateral_vel: f32,
}

impl Player {
    pub fn new(z: f32) -> Self {
        Self {
            z,
            ..Default::default()
        }
    }

    /// Apply one tick of steering
    ///
    /// With the lean scheme and no sensor reading, the keyboard axis is used.
    pub fn steer(
        &mut self,
        axis: f32,
        lean_degrees: Option<f32>,
        settings: &ControlSettings,
        dt: f32,
    ) {
        if dt <= 0.0 {
            self.lateral_vel = 0.0;
            return;
        }
        let before = self.lateral;
        match (settings.scheme, lean_degrees) {
            (ControlScheme::Lean, Some(lean)) => {
                let target = lean_to_lateral(lean, settings);
                self.move_toward(target, settings.lateral_speed * dt);
            }
            _ => {
                let axis = if axis.is_finite() { axis.clamp(-1.0, 1.0) } else { 0.0 };
                self.lateral += axis * settings.lateral_speed * dt;
            }
        }
        self.lateral = self
            .lateral
            .clamp(-settings.half_width, settings.half_width);
        self.lateral_vel = (self.lateral - before) / dt;
    }

    fn move_toward(&mut self, target: f32, max_delta: f32) {
        let delta = (target - self.lateral).clamp(-max_delta, max_delta);
        self.lateral += delta;
    }
}
