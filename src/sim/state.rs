//! Simulation state and core types
//!
//! Everything a run owns lives in [`SimulationState`]; components are
//! reached through it, never through globals.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionDetector, CollisionKind};
use super::obstacles::ObstacleGenerator;
use super::physics::PhysicsIntegrator;
use super::score::ScoreEngine;
use crate::consts::{PLAYER_ID, TICK_MS};
use crate::tuning::{Tuning, TuningError};

/// Identifier for simulated entities (actors and obstacles)
pub type EntityId = u32;

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Title screen, nothing simulated
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen; no component advances
    Paused,
    /// Run ended by a collision
    GameOver,
}

/// Requests that move the session between states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    /// Resolves to Pause or Resume depending on the current state
    TogglePause,
    Collide,
    Restart,
    Abandon,
}

/// One accepted transition, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: SessionState,
    pub to: SessionState,
    pub command: SessionCommand,
    /// Run tick at which the transition happened
    pub tick: u64,
}

/// Number of transitions the log keeps
pub const TRANSITION_LOG_LEN: usize = 32;

/// Bounded ring of recent transitions (oldest first)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
}

impl TransitionLog {
    pub fn push(&mut self, record: TransitionRecord) {
        if self.records.len() == TRANSITION_LOG_LEN {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The player-controlled flyer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    /// Horizontal position (fixed for the whole run)
    pub x: f32,
    pub y: f32,
    /// Vertical velocity in px/tick (positive = down)
    pub velocity: f32,
    /// Tilt for presentation only
    pub rotation: f32,
    pub alive: bool,
}

impl Actor {
    /// Actor at its start pose
    pub fn spawn(id: EntityId, tuning: &Tuning) -> Self {
        Self {
            id,
            x: tuning.actor_x,
            y: tuning.actor_start_y,
            velocity: 0.0,
            rotation: 0.0,
            alive: true,
        }
    }
}

/// Events produced by a tick or a transition, for audio/particles/persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Flapped {
        velocity: f32,
    },
    ObstacleSpawned {
        id: EntityId,
        gap_center_y: f32,
        gap_height: f32,
    },
    ObstacleCleared {
        id: EntityId,
        points: f64,
        score: f64,
        combo: u32,
        multiplier: f64,
    },
    MultiplierIncreased {
        multiplier: f64,
    },
    ComboExpired,
    Collided {
        kind: CollisionKind,
        point: Vec2,
    },
    /// Emitted exactly once when a run ends
    ScoreSubmitted {
        final_score: u64,
    },
    SessionChanged {
        from: SessionState,
        to: SessionState,
    },
}

/// Actor pose as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActorView {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Obstacle geometry as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleView {
    pub x: f32,
    pub gap_center_y: f32,
    pub gap_height: f32,
}

/// Read-only per-tick view for rendering; the core never draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub actor: ActorView,
    pub obstacles: Vec<ObstacleView>,
    pub score: f64,
    pub combo_multiplier: f64,
    pub session_state: SessionState,
    pub collision_flash_active: bool,
    pub invincible: bool,
}

/// Complete simulation state (deterministic for a given tuning and input)
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tuning: Tuning,
    pub session: SessionState,
    pub transitions: TransitionLog,
    pub actor: Actor,
    pub physics: PhysicsIntegrator,
    pub obstacles: ObstacleGenerator,
    pub collision: CollisionDetector,
    pub score: ScoreEngine,
    /// Ticks advanced in the current run
    pub run_ticks: u64,
    /// Ticks advanced across every run of this session
    pub total_ticks: u64,
}

impl SimulationState {
    /// Build a session in the menu, validating the tuning first
    pub fn new(tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        log::info!("Simulation created with seed {:#x}", tuning.seed);
        Ok(Self {
            session: SessionState::Menu,
            transitions: TransitionLog::default(),
            actor: Actor::spawn(PLAYER_ID, &tuning),
            physics: PhysicsIntegrator::new(&tuning),
            obstacles: ObstacleGenerator::new(&tuning),
            collision: CollisionDetector::new(&tuning),
            score: ScoreEngine::new(&tuning),
            run_ticks: 0,
            total_ticks: 0,
            tuning,
        })
    }

    /// Simulation clock for the current run in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.run_ticks as f64 * TICK_MS
    }

    /// Zero every component ahead of a fresh run
    pub(crate) fn reset_run(&mut self) {
        self.physics.reset(self.actor.id);
        self.actor = Actor::spawn(self.actor.id, &self.tuning);
        self.obstacles.reset();
        self.collision.reset();
        self.score.reset();
        self.run_ticks = 0;
        // Grace window so a run can't end on its first frames
        self.collision
            .activate_invincibility(self.tuning.invincibility_ticks);
    }

    /// Read-only view for a renderer
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            actor: ActorView {
                x: self.actor.x,
                y: self.actor.y,
                rotation: self.actor.rotation,
            },
            obstacles: self
                .obstacles
                .obstacles()
                .iter()
                .map(|o| ObstacleView {
                    x: o.x,
                    gap_center_y: o.gap_center_y,
                    gap_height: o.gap_height,
                })
                .collect(),
            score: self.score.state().score,
            combo_multiplier: self.score.state().multiplier,
            session_state: self.session,
            collision_flash_active: self.collision.is_flash_active(),
            invincible: self.collision.is_invincible(),
        }
    }
}
