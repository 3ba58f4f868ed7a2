//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order for obstacles, id order for history)
//! - No rendering, audio or platform dependencies; effects are returned as
//!   [`GameEvent`]s

pub mod collision;
pub mod obstacles;
pub mod physics;
pub mod score;
pub mod session;
pub mod state;
pub mod tick;

pub use collision::{CollisionDetector, CollisionKind, CollisionOutcome, HitRecord, Hitbox};
pub use obstacles::{DifficultyState, DifficultyStats, Obstacle, ObstacleGenerator, StepReport};
pub use physics::{PhysicsIntegrator, PhysicsParams};
pub use score::{ScoreChange, ScoreEngine, ScoreState};
pub use session::{TransitionError, next_state};
pub use state::{
    Actor, ActorView, EntityId, GameEvent, ObstacleView, RenderSnapshot, SessionCommand,
    SessionState, SimulationState, TRANSITION_LOG_LEN, TransitionLog, TransitionRecord,
};
pub use tick::{TickInput, tick};
