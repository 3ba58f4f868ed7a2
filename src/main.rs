//! Skyflap headless runner
//!
//! Drives the simulation in attract mode with a fixed-step accumulator,
//! restarting after every crash, then prints the final snapshot as JSON.
//!
//! Usage: `skyflap [tuning.json] [ticks]`

use std::error::Error;

use skyflap::consts::{MAX_SUBSTEPS, TICK_MS};
use skyflap::{GameEvent, SessionState, SimulationState, TickInput, Tuning, tick};

/// Default run length (one minute of game time)
const DEFAULT_TICKS: u64 = 3600;

/// Frame-paced driver around the simulation
struct Runner {
    state: SimulationState,
    input: TickInput,
    accumulator_ms: f64,
    submitted: Vec<u64>,
}

impl Runner {
    fn new(state: SimulationState) -> Self {
        Self {
            state,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
            accumulator_ms: 0.0,
            submitted: Vec::new(),
        }
    }

    /// Run as many ticks as the elapsed frame time allows
    fn update(&mut self, frame_ms: f64) {
        self.accumulator_ms += frame_ms.min(100.0);

        let mut substeps = 0;
        while self.accumulator_ms >= TICK_MS && substeps < MAX_SUBSTEPS {
            let events = tick(&mut self.state, &self.input);
            self.accumulator_ms -= TICK_MS;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.flaps = 0;
            self.input.start = false;
            self.input.pause = false;
            self.input.abandon = false;

            self.handle_events(&events);
        }
    }

    fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::ScoreSubmitted { final_score } => {
                    log::info!("Submitting final score {final_score}");
                    self.submitted.push(*final_score);
                }
                GameEvent::MultiplierIncreased { multiplier } => {
                    log::debug!("Multiplier x{multiplier:.1}");
                }
                GameEvent::Collided { kind, point } => {
                    log::debug!("Collided with {kind:?} at ({:.0}, {:.0})", point.x, point.y);
                }
                _ => {}
            }
        }
        if self.state.session == SessionState::GameOver {
            self.input.start = true;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let ticks = match args.next() {
        Some(n) => n.parse::<u64>()?,
        None => DEFAULT_TICKS,
    };

    log::info!("Skyflap (headless) starting, {ticks} ticks");
    let mut runner = Runner::new(SimulationState::new(tuning)?);
    runner.input.start = true;

    while runner.state.total_ticks < ticks {
        runner.update(TICK_MS);
    }

    let best = runner.submitted.iter().max().copied().unwrap_or(0);
    log::info!(
        "Finished: {} runs, best score {}, current score {}",
        runner.submitted.len(),
        best,
        runner.state.score.final_score()
    );
    println!("{}", serde_json::to_string_pretty(&runner.state.snapshot())?);
    Ok(())
}
