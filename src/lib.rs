//! Skyflap - a side-scrolling obstacle flyer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, collisions, scoring, session)
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio and persistence are external: they consume
//! [`sim::RenderSnapshot`]s and [`sim::GameEvent`]s.

pub mod sim;
pub mod tuning;

pub use sim::{GameEvent, RenderSnapshot, SessionState, SimulationState, TickInput, tick};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Duration of one tick in milliseconds
    pub const TICK_MS: f64 = 1000.0 / TICKS_PER_SECOND as f64;
    /// Physics timestep; velocities are expressed per tick
    pub const TICK_DT: f32 = 1.0;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Entity id of the player actor
    pub const PLAYER_ID: u32 = 1;
}

/// Replace NaN/infinite values with 0 before they reach integration
#[inline]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(3.5), 3.5);
        assert_eq!(finite_or_zero(f32::NAN), 0.0);
        assert_eq!(finite_or_zero(f32::NEG_INFINITY), 0.0);
    }
}
