//! Space Rocks headless runner
//!
//! Drives a session through the same fixed-timestep loop a windowed host
//! would use, with a scripted pilot standing in for the keyboard. Prints a
//! JSON summary when the run ends.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use space_rocks::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use space_rocks::sim::{GameEvent, GamePhase, GameSession, InputState, TickResult, tick};
use space_rocks::{SimError, Tuning, normalize_angle};

#[derive(Parser)]
#[command(name = "space-rocks")]
#[command(about = "Run a headless Space Rocks session with a scripted pilot")]
struct Args {
    /// Session seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Stop after this many simulation ticks
    #[arg(long, default_value_t = 60 * 60 * 5)]
    ticks: u64,
    /// Host frame rate fed into the fixed-step accumulator
    #[arg(long, default_value_t = 55.0)]
    fps: f32,
    /// JSON tuning override
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Print every game event as it happens
    #[arg(long)]
    show_all_events: bool,
    /// Print the final tick result as JSON
    #[arg(long)]
    snapshot: bool,
}

/// What the high-score keeper gets at the end of a run
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    final_score: u64,
    level: u32,
    lives: u32,
    phase: GamePhase,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Tuning::from_json(&json).with_context(|| format!("bad tuning in {}", path.display()))?
        }
        None => Tuning::default(),
    };

    log::info!("Space Rocks (headless) starting with seed {}", args.seed);
    let mut session = GameSession::with_tuning(args.seed, tuning);

    let frame_dt = (1.0 / args.fps.max(1.0)).min(MAX_FRAME_DT);
    let mut accumulator = 0.0;
    let mut last: Option<TickResult> = None;

    'run: while session.time_ticks < args.ticks {
        accumulator += frame_dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = pilot(&session);
            let outcome = tick(&mut session, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;

            // Broken entities are already out of play; keep going
            let result = match outcome {
                Ok(result) => result,
                Err(err @ SimError::InvariantViolated { .. }) => {
                    log::warn!("tick {}: {}", session.time_ticks, err);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            report(&result.events, args.show_all_events);
            let over = result.phase == GamePhase::GameOver;
            last = Some(result);
            if over {
                break 'run;
            }
        }
    }

    let summary = RunSummary {
        seed: args.seed,
        ticks: session.time_ticks,
        final_score: session.score,
        level: session.level,
        lives: session.lives(),
        phase: session.phase,
    };
    println!("{}", serde_json::to_string(&summary)?);

    if args.snapshot {
        if let Some(result) = &last {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }

    Ok(())
}

/// Log the interesting events; echo all of them on request
fn report(events: &[GameEvent], show_all: bool) {
    for event in events {
        if show_all {
            println!("{:?}", event);
        }
        match event {
            GameEvent::LevelStarted { level } => log::info!("Level {}", level),
            GameEvent::ShipDestroyed { lives_left } => log::info!("Ship lost, {} left", lives_left),
            GameEvent::GameOver { final_score } => log::info!("Final score {}", final_score),
            _ => {}
        }
    }
}

/// Scripted pilot: turn toward the nearest rock, shoot when lined up
fn pilot(session: &GameSession) -> InputState {
    let ship = &session.ship;
    if !ship.body.alive {
        return InputState::default();
    }

    let nearest = session.rocks.iter().min_by(|a, b| {
        let da = a.body.pos.distance_squared(ship.body.pos);
        let db = b.body.pos.distance_squared(ship.body.pos);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    let Some(rock) = nearest else {
        return InputState::default();
    };

    let to_rock = rock.body.pos - ship.body.pos;
    let desired = to_rock.y.atan2(to_rock.x);
    let delta = normalize_angle(desired - ship.body.heading);
    let lined_up = delta.abs() < 0.15;

    InputState {
        rotate_left: delta < -0.05,
        rotate_right: delta > 0.05,
        thrust: lined_up && to_rock.length() > 250.0,
        // Alternate ticks so every shot is a fresh press
        fire: lined_up && session.time_ticks % 2 == 0,
        pause_toggled: false,
    }
}
