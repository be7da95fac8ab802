//! Endless Runner headless driver
//!
//! Runs the simulation with a fixed timestep, steering the runner in a slow
//! weave, and logs what the track streamer does.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use endless_runner::consts::*;
use endless_runner::sim::{ControlScheme, InstanceRegistry, RunState, TickInput, tick};
use endless_runner::{Difficulty, HighScores, Settings};

/// Render frame interval the driver pretends to run at
const FRAME_DT: f32 = 1.0 / 144.0;

#[derive(Parser)]
#[command(name = "endless-runner")]
#[command(
    author,
    version,
    about = "Headless endless-runner track streaming simulation"
)]
struct Args {
    /// Settings file (JSON); defaults are used when omitted
    settings: Option<PathBuf>,

    /// Run seed
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Difficulty preset, overriding the settings file (easy, normal, hard)
    #[arg(long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// Control scheme, overriding the settings file (keyboard, lean)
    #[arg(long, value_parser = parse_scheme)]
    scheme: Option<ControlScheme>,

    /// Leaderboard file the finished run is recorded in
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

fn parse_scheme(s: &str) -> Result<ControlScheme, String> {
    ControlScheme::from_str(s).ok_or_else(|| format!("unknown control scheme '{s}'"))
}

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    log::info!("Endless Runner (headless) starting...");

    let mut settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("Using default settings");
            Settings::default()
        }
    };
    if let Some(difficulty) = args.difficulty {
        settings.apply_preset(difficulty);
    }
    if let Some(scheme) = args.scheme {
        settings.control.scheme = scheme;
    }
    log::info!(
        "Difficulty {}, control scheme {}",
        settings.difficulty.as_str(),
        settings.control.scheme.as_str()
    );

    let mut state = RunState::new(&settings, InstanceRegistry::new(), args.seed);
    log::info!("Run initialized with seed: {}", args.seed);

    let mut accumulator = 0.0f32;
    let mut elapsed = 0.0f32;
    let mut spawned = 0usize;
    let mut recycled = 0usize;
    let mut zone_gaps = 0usize;

    while elapsed < args.seconds {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let weave = (state.elapsed() * 0.5).sin();
            let input = TickInput {
                steer: weave,
                lean_degrees: Some(20.0 * weave),
                ..Default::default()
            };
            let report = tick(&mut state, &input, SIM_DT);
            spawned += report.spawned;
            recycled += report.recycled;
            zone_gaps += report.content.zone_gaps;
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if state.time_ticks > 0 && state.time_ticks % (10 * 60) == 0 && substeps > 0 {
            log::debug!(
                "t={:.0}s speed={:.1} lateral={:.2} segments={} live content={}",
                state.elapsed(),
                state.current_speed(),
                state.player.lateral,
                state.streamer.active_len(),
                state.streamer.factory().live_count()
            );
        }
    }

    log::info!(
        "Ran {} ticks: speed {:.1} ({:.0}% of ramp), distance {:.1}, score {}",
        state.time_ticks,
        state.current_speed(),
        state.speed_progress() * 100.0,
        state.score.distance,
        state.score.score()
    );
    log::info!(
        "Track: {} segments ({} pooled), {} spawned ahead, {} recycled, {} zone gaps",
        state.streamer.segment_count(),
        state.streamer.pool_len(),
        spawned,
        recycled,
        zone_gaps
    );
    let factory = state.streamer.factory();
    log::info!(
        "Content: {} live, {} spawned, {} despawned",
        factory.live_count(),
        factory.spawned_total,
        factory.despawned_total
    );

    if state.streamer.is_disabled() {
        log::error!("Track streamer was disabled; no track was generated");
        return ExitCode::FAILURE;
    }

    let mut scores = match &args.scores {
        Some(path) => match HighScores::load(path) {
            Ok(scores) => scores,
            Err(err) => {
                log::error!("{}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => HighScores::new(),
    };
    state.record_score(&mut scores, now_millis());
    if let Some(path) = &args.scores {
        if let Err(err) = scores.save(path) {
            log::error!("{}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
