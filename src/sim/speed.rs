//! Forward speed ramp
//!
//! Speed grows with time spent running, from `base_speed` to `max_speed`
//! over `ramp_seconds`.

use serde::{Deserialize, Serialize};

use crate::settings::SpeedSettings;
use crate::{lerp, smoothstep};

/// Shape of the ramp from base to max speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedCurve {
    /// Always base speed
    Constant,
    #[default]
    Linear,
    /// Slow start and finish
    SmoothStep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedController {
    settings: SpeedSettings,
    elapsed: f32,
}

impl SpeedController {
    pub fn new(settings: SpeedSettings) -> Self {
        Self {
            settings,
            elapsed: 0.0,
        }
    }

    /// Accumulate active time; negative or non-finite steps are ignored
    pub fn tick(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Seconds of active running
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Ramp position in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.settings.ramp_seconds <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.settings.ramp_seconds).clamp(0.0, 1.0)
    }

    /// Current forward speed
    pub fn speed(&self) -> f32 {
        let t = match self.settings.curve {
            SpeedCurve::Constant => 0.0,
            SpeedCurve::Linear => self.progress(),
            SpeedCurve::SmoothStep => smoothstep(self.progress()),
        };
        lerp(self.settings.base_speed, self.settings.max_speed, t)
    }

    pub fn settings(&self) -> &SpeedSettings {
        &self.settings
    }
}
