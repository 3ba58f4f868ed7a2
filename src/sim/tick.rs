//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation deterministically.
//! Per tick while playing: flaps → physics → obstacles → collision →
//! combo timeout → clears.

use super::state::{EntityId, GameEvent, SessionCommand, SessionState, SimulationState};
use crate::consts::TICK_DT;

/// Ticks of velocity the autopilot projects ahead
const AUTOPILOT_LOOKAHEAD: f32 = 4.0;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Flap presses since the last tick; each one is an impulse
    pub flaps: u32,
    /// Pause toggle
    pub pause: bool,
    /// Start from the menu, or restart after game over
    pub start: bool,
    /// Back to the menu from pause or game over
    pub abandon: bool,
    /// Attract mode - the simulation flaps for itself
    pub autopilot: bool,
}

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimulationState, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    // Flaps only count if they arrived during play
    let was_playing = state.session == SessionState::Playing;

    if input.start {
        let command = match state.session {
            SessionState::GameOver => SessionCommand::Restart,
            _ => SessionCommand::Start,
        };
        transition(state, command, &mut events);
    }
    if input.pause {
        transition(state, SessionCommand::TogglePause, &mut events);
    }
    if input.abandon {
        transition(state, SessionCommand::Abandon, &mut events);
    }

    match state.session {
        SessionState::Playing => {}
        SessionState::GameOver => {
            state.collision.update_flash();
            return events;
        }
        SessionState::Menu | SessionState::Paused => return events,
    }

    state.run_ticks += 1;
    state.total_ticks += 1;
    state.collision.update();

    let id = state.actor.id;

    // --- INPUT ---
    let mut flaps = if was_playing { input.flaps } else { 0 };
    if input.autopilot && autopilot_wants_flap(state) {
        flaps = flaps.max(1);
    }
    for _ in 0..flaps {
        let velocity = state.physics.apply_impulse(&mut state.actor, id);
        events.push(GameEvent::Flapped { velocity });
    }

    // --- PHYSICS ---
    state.physics.apply_gravity(&mut state.actor);
    state.physics.update_position(&mut state.actor, id, TICK_DT);

    // --- OBSTACLES ---
    state.obstacles.update_difficulty(state.score.state().score);
    let report = state.obstacles.step(None);
    for spawned in report.spawned {
        if let Some(o) = state.obstacles.obstacles().iter().find(|o| o.id == spawned) {
            events.push(GameEvent::ObstacleSpawned {
                id: o.id,
                gap_center_y: o.gap_center_y,
                gap_height: o.gap_height,
            });
        }
    }

    // --- COLLISION ---
    let outcome = state
        .collision
        .check(state.actor.x, state.actor.y, state.obstacles.obstacles());
    if outcome.hit {
        events.push(GameEvent::Collided {
            kind: outcome.kind,
            point: outcome.impact_point,
        });
        transition(state, SessionCommand::Collide, &mut events);
        return events;
    }

    // --- SCORING ---
    let now_ms = state.now_ms();
    if state.score.update_combo_timeout(now_ms) {
        events.push(GameEvent::ComboExpired);
    }
    for passed in state.obstacles.passed_uncleared(state.actor.x) {
        events.extend(state.clear_obstacle(passed));
    }

    events
}

impl SimulationState {
    /// Score an obstacle the actor has passed. Clearing an obstacle twice
    /// (or one that no longer exists) awards nothing.
    pub fn clear_obstacle(&mut self, id: EntityId) -> Vec<GameEvent> {
        if !self.obstacles.mark_cleared(id) {
            log::debug!("Obstacle {id} already cleared, ignoring");
            return Vec::new();
        }
        let now_ms = self.now_ms();
        let change = self.score.on_obstacle_cleared(now_ms);
        let mut events = vec![GameEvent::ObstacleCleared {
            id,
            points: change.points,
            score: change.state.score,
            combo: change.state.combo_count,
            multiplier: change.state.multiplier,
        }];
        if change.multiplier_increased {
            events.push(GameEvent::MultiplierIncreased {
                multiplier: change.state.multiplier,
            });
        }
        events
    }
}

/// Request a transition from inside the loop; rejections are only logged
fn transition(state: &mut SimulationState, command: SessionCommand, events: &mut Vec<GameEvent>) {
    if let Ok(produced) = state.request(command) {
        events.extend(produced);
    }
}

/// Flap when the actor is about to sink below the next gap's centre
fn autopilot_wants_flap(state: &SimulationState) -> bool {
    let actor = &state.actor;
    if actor.velocity < 0.0 {
        return false;
    }
    let target = state
        .obstacles
        .next_uncleared()
        .map(|o| o.gap_center_y)
        .unwrap_or_else(|| state.tuning.gap_midpoint());
    actor.y + actor.velocity * AUTOPILOT_LOOKAHEAD > target
}
