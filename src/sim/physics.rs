//! Vertical flight integration
//!
//! Gravity with drag, momentum-aware flaps, and smoothed position updates.
//! Per-entity history is kept in an explicit table so several actors can be
//! integrated by one integrator.

use std::collections::{BTreeMap, VecDeque};

use super::state::{Actor, EntityId};
use crate::finite_or_zero;
use crate::tuning::Tuning;

/// Physics constants copied out of the tuning at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub air_resistance: f32,
    pub terminal_up: f32,
    pub terminal_down: f32,
    pub impulse_strength: f32,
    pub momentum_conservation: f32,
    pub rising_blend: f32,
    pub falling_blend: f32,
    pub smoothing: f32,
    pub history_len: usize,
    pub rotation_factor: f32,
    pub max_rotation: f32,
}

impl From<&Tuning> for PhysicsParams {
    fn from(t: &Tuning) -> Self {
        Self {
            gravity: t.gravity,
            air_resistance: t.air_resistance,
            terminal_up: t.terminal_up,
            terminal_down: t.terminal_down,
            impulse_strength: t.impulse_strength,
            momentum_conservation: t.momentum_conservation,
            rising_blend: t.rising_blend,
            falling_blend: t.falling_blend,
            smoothing: t.position_smoothing,
            history_len: t.velocity_history_len.max(1),
            rotation_factor: t.rotation_factor,
            max_rotation: t.max_rotation,
        }
    }
}

/// Per-entity integration memory
#[derive(Debug, Clone, Default, PartialEq)]
struct MotionHistory {
    /// Position applied on the previous tick
    previous_position: Option<f32>,
    /// Recent velocities (newest last)
    velocities: VecDeque<f32>,
}

/// Advances actors under gravity, drag and flap impulses
#[derive(Debug, Clone)]
pub struct PhysicsIntegrator {
    params: PhysicsParams,
    history: BTreeMap<EntityId, MotionHistory>,
}

impl PhysicsIntegrator {
    pub fn new(tuning: &Tuning) -> Self {
        Self::with_params(PhysicsParams::from(tuning))
    }

    pub fn with_params(params: PhysicsParams) -> Self {
        Self {
            params,
            history: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    #[inline]
    fn clamp_velocity(&self, v: f32) -> f32 {
        v.clamp(self.params.terminal_up, self.params.terminal_down)
    }

    /// `v ← (v + G) * drag`, clamped to the terminal band
    pub fn apply_gravity(&self, actor: &mut Actor) {
        let v = sanitized(actor.velocity, actor.id, "velocity");
        let v = (v + self.params.gravity) * self.params.air_resistance;
        actor.velocity = self.clamp_velocity(v);
    }

    /// Flap. Part of the pre-flap velocity survives, more of it when already
    /// rising, so repeated flaps neither cancel out nor stack without bound.
    ///
    /// Returns the new velocity.
    pub fn apply_impulse(&mut self, actor: &mut Actor, entity: EntityId) -> f32 {
        let p = &self.params;
        let pre = self.clamp_velocity(sanitized(actor.velocity, entity, "velocity"));
        let blend = if pre < 0.0 {
            p.rising_blend
        } else {
            p.falling_blend
        };
        let momentum = pre * blend * p.momentum_conservation;
        let v = (p.impulse_strength + momentum).clamp(p.terminal_up, p.terminal_down);

        actor.velocity = v;
        v
    }

    /// Move by `v * dt`, smoothed against last tick's position, and refresh
    /// the derived rotation.
    pub fn update_position(&mut self, actor: &mut Actor, entity: EntityId, dt: f32) {
        let y = sanitized(actor.y, entity, "position");
        let v = self.clamp_velocity(sanitized(actor.velocity, entity, "velocity"));
        actor.velocity = v;

        let target = finite_or_zero(y + v * dt);
        let smoothing = self.params.smoothing;
        let history_len = self.params.history_len;
        let entry = self.history.entry(entity).or_default();
        let previous = entry.previous_position.unwrap_or(y);
        let smoothed = target + (previous - target) * smoothing;
        // Far-apart extremes can overflow the blend
        let smoothed = if smoothed.is_finite() { smoothed } else { target };

        entry.previous_position = Some(smoothed);
        entry.velocities.push_back(v);
        while entry.velocities.len() > history_len {
            entry.velocities.pop_front();
        }

        actor.y = smoothed;
        actor.rotation = self.rotation(entity);
    }

    /// Presentation tilt from the averaged recent velocity
    pub fn rotation(&self, entity: EntityId) -> f32 {
        let Some(history) = self.history.get(&entity) else {
            return 0.0;
        };
        if history.velocities.is_empty() {
            return 0.0;
        }
        let avg = history.velocities.iter().sum::<f32>() / history.velocities.len() as f32;
        let max = self.params.max_rotation;
        (avg * self.params.rotation_factor).clamp(-max, max)
    }

    /// Average of the recorded velocity samples, if any
    pub fn average_velocity(&self, entity: EntityId) -> Option<f32> {
        let history = self.history.get(&entity)?;
        if history.velocities.is_empty() {
            return None;
        }
        Some(history.velocities.iter().sum::<f32>() / history.velocities.len() as f32)
    }

    /// Forget one entity's history
    pub fn reset(&mut self, entity: EntityId) {
        self.history.remove(&entity);
    }

    pub fn reset_all(&mut self) {
        self.history.clear();
    }

    pub fn tracked_entities(&self) -> usize {
        self.history.len()
    }
}

fn sanitized(value: f32, entity: EntityId, what: &str) -> f32 {
    if !value.is_finite() {
        log::warn!("Entity {entity}: non-finite {what} ({value}) reset to 0");
    }
    finite_or_zero(value)
}
