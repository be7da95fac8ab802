//! Fixed timestep simulation tick
//!
//! Advances a run deterministically: input, speed ramp, steering, scoring,
//! then track streaming.

use super::factory::ContentFactory;
use super::state::{RunPhase, RunState};
use super::streamer::TickReport;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Keyboard steering axis in [-1, 1]
    pub steer: f32,
    /// Motion-sensor lean in degrees, when a reading is available
    pub lean_degrees: Option<f32>,
    /// Pause toggle
    pub pause: bool,
    /// The player hit an obstacle this tick
    pub crashed: bool,
    /// Pickups the engine reported collected this tick
    pub pickups_collected: u32,
}

/// Advance the run by one timestep
pub fn tick<F: ContentFactory>(state: &mut RunState<F>, input: &TickInput, dt: f32) -> TickReport {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            RunPhase::Running => {
                state.phase = RunPhase::Paused;
                return TickReport::default();
            }
            RunPhase::Paused => state.phase = RunPhase::Running,
            RunPhase::GameOver => {}
        }
    }

    if state.phase != RunPhase::Running {
        return TickReport::default();
    }

    if input.crashed {
        state.phase = RunPhase::GameOver;
        log::info!(
            "Run over after {:.1}s: distance {:.1}, score {}",
            state.elapsed(),
            state.score.distance,
            state.score.score()
        );
        return TickReport::default();
    }

    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    state.time_ticks += 1;

    state.speed.tick(dt);
    let speed = state.speed.speed();
    state.streamer.set_speed(speed);

    state
        .player
        .steer(input.steer, input.lean_degrees, &state.control, dt);

    state.score.add_distance(speed * dt);
    state.score.collect_pickups(input.pickups_collected);

    state.streamer.tick(dt, state.player.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::score::HighScores;
    use crate::settings::Settings;
    use crate::sim::factory::InstanceRegistry;

    fn run(seed: u64) -> RunState<InstanceRegistry> {
        RunState::new(&Settings::default(), InstanceRegistry::new(), seed)
    }

    #[test]
    fn test_tick_pause() {
        let mut state = run(12345);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 1);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, RunPhase::Paused);

        // Paused runs do not advance
        let rear = state.streamer.rear_z();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.streamer.rear_z(), rear);

        // Unpause
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_crash_ends_run() {
        let mut state = run(1);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let crash = TickInput {
            crashed: true,
            ..Default::default()
        };
        tick(&mut state, &crash, SIM_DT);
        assert!(state.is_over());

        let score = state.score.score();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.score.score(), score);
    }

    #[test]
    fn test_finished_run_enters_leaderboard() {
        let mut scores = HighScores::new();
        let mut state = run(11);
        // Nothing travelled yet
        assert_eq!(state.record_score(&mut scores, 0.0), None);

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let crash = TickInput {
            crashed: true,
            ..Default::default()
        };
        tick(&mut state, &crash, SIM_DT);

        assert_eq!(state.record_score(&mut scores, 1.0), Some(1));
        assert_eq!(scores.top_score(), Some(state.score.score()));
        assert_eq!(scores.entries[0].distance, state.score.distance);
    }

    #[test]
    fn test_speed_ramps_and_scrolls_track() {
        let mut state = run(7);
        let start_speed = state.current_speed();
        let mut recycled = 0;
        for _ in 0..(60 * 10) {
            recycled += tick(&mut state, &TickInput::default(), SIM_DT).recycled;
        }
        assert!(state.current_speed() > start_speed);
        assert!(state.speed_progress() > 0.0 && state.speed_progress() < 1.0);
        assert!((state.elapsed() - 10.0).abs() < 0.01);
        assert!(recycled > 0);
        assert!(state.score.distance > 100.0);
    }

    #[test]
    fn test_pickups_score() {
        let mut state = run(3);
        let input = TickInput {
            pickups_collected: 2,
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        assert_eq!(state.score.pickups, 2);
        assert_eq!(state.score.score(), 100);
    }

    #[test]
    fn test_missing_template_run_is_inert() {
        let settings = Settings {
            template: None,
            ..Default::default()
        };
        let mut state = RunState::new(&settings, InstanceRegistry::new(), 5);
        assert!(state.streamer.is_disabled());
        for _ in 0..10 {
            let report = tick(&mut state, &TickInput::default(), SIM_DT);
            assert_eq!(report, TickReport::default());
        }
        assert_eq!(state.streamer.active_len(), 0);
        assert_eq!(state.phase, RunPhase::Running);
    }

    #[test]
    fn test_determinism() {
        // Two runs with the same seed lay out identical track
        let mut state1 = run(99999);
        let mut state2 = run(99999);

        let inputs = [
            TickInput {
                steer: 1.0,
                ..Default::default()
            },
            TickInput {
                lean_degrees: Some(12.0),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..200 {
            for input in &inputs {
                tick(&mut state1, input, SIM_DT);
                tick(&mut state2, input, SIM_DT);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert!((state1.player.lateral - state2.player.lateral).abs() < 0.0001);
        let layout = |s: &RunState<InstanceRegistry>| {
            s.streamer
                .segments()
                .map(|seg| (seg.id, seg.spawned().to_vec()))
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(&state1), layout(&state2));
    }
}
