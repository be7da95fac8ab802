//! Run state
//!
//! Everything one run owns: the player, the speed ramp, the score and the
//! track streamer with its content factory.

use serde::{Deserialize, Serialize};

use super::factory::ContentFactory;
use super::player::Player;
use super::speed::SpeedController;
use super::streamer::TrackStreamer;
use crate::score::{HighScores, ScoreCounter};
use crate::settings::{ControlSettings, Settings};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Track scrolling, player steering
    Running,
    /// Frozen until unpaused
    Paused,
    /// Run ended
    GameOver,
}

/// Complete state of one run
#[derive(Debug)]
pub struct RunState<F: ContentFactory> {
    /// Run seed for reproducible layouts
    pub seed: u64,
    pub phase: RunPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    pub score: ScoreCounter,
    pub speed: SpeedController,
    pub streamer: TrackStreamer<F>,
    pub control: ControlSettings,
}

impl<F: ContentFactory> RunState<F> {
    /// Start a run at forward position 0
    ///
    /// A streamer that fails to initialize stays disabled; the run still
    /// ticks but no track appears.
    pub fn new(settings: &Settings, factory: F, seed: u64) -> Self {
        let mut streamer = TrackStreamer::new(
            settings.track.clone(),
            settings.template.clone(),
            settings.spawn_content(),
            factory,
            seed,
        );
        let speed = SpeedController::new(settings.speed.clone());
        streamer.set_speed(speed.speed());

        let player = Player::new(0.0);
        if let Err(err) = streamer.initialize(player.z) {
            log::error!("Run {} started without track: {}", seed, err);
        }

        Self {
            seed,
            phase: RunPhase::Running,
            time_ticks: 0,
            player,
            score: ScoreCounter::new(settings.scoring.clone()),
            speed,
            streamer,
            control: settings.control.clone(),
        }
    }

    /// Current forward speed
    pub fn current_speed(&self) -> f32 {
        self.speed.speed()
    }

    /// Seconds spent running (pauses excluded)
    pub fn elapsed(&self) -> f32 {
        self.speed.elapsed()
    }

    /// Speed ramp position in [0, 1]
    pub fn speed_progress(&self) -> f32 {
        self.speed.progress()
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    /// Enter this run's score on a leaderboard; returns the rank achieved
    pub fn record_score(&self, scores: &mut HighScores, timestamp: f64) -> Option<usize> {
        let score = self.score.score();
        let rank = scores.add_score(score, self.score.distance, timestamp);
        match rank {
            Some(rank) => log::info!("Run {} ranked #{} with score {}", self.seed, rank, score),
            None => log::info!("Run {} scored {}; not a high score", self.seed, score),
        }
        rank
    }
}
