//! Data-driven game balance
//!
//! Every number the simulation uses lives here as a named, overridable
//! constant. A partial JSON document only overrides the fields it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a [`Tuning`]
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Simulation tuning constants (units are pixels and ticks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub screen_width: f32,
    pub screen_height: f32,

    // === Actor ===
    /// Fixed horizontal position of the actor
    pub actor_x: f32,
    /// Vertical position at the start of every run
    pub actor_start_y: f32,
    /// Sprite radius before forgiveness is applied
    pub actor_radius: f32,
    /// Shrinks the hitbox so pixel-level grazes don't count
    pub hitbox_tolerance: f32,

    // === Physics ===
    /// Downward acceleration (px/tick²)
    pub gravity: f32,
    /// Velocity multiplier applied after gravity each tick
    pub air_resistance: f32,
    /// Fastest allowed upward velocity (negative)
    pub terminal_up: f32,
    /// Fastest allowed downward velocity (positive)
    pub terminal_down: f32,
    /// Base velocity of a flap (negative = up)
    pub impulse_strength: f32,
    /// How much pre-flap velocity survives a flap, 0..=1
    pub momentum_conservation: f32,
    /// Fraction of upward velocity carried into a flap
    pub rising_blend: f32,
    /// Fraction of downward velocity carried into a flap
    pub falling_blend: f32,
    /// Weight of the previous position in the smoothed position, 0..=1
    pub position_smoothing: f32,
    /// Velocity samples kept per entity
    pub velocity_history_len: usize,
    /// Radians of tilt per px/tick of averaged velocity
    pub rotation_factor: f32,
    /// Tilt clamp (radians)
    pub max_rotation: f32,

    // === Obstacles ===
    pub obstacle_width: f32,
    pub initial_gap_height: f32,
    pub min_gap_height: f32,
    /// Gap shrink per score point
    pub gap_shrink_rate: f32,
    /// Lowest allowed gap centre (screen y grows downward)
    pub min_gap_y: f32,
    /// Highest allowed gap centre
    pub max_gap_y: f32,
    /// Random walk step as a fraction of the gap centre range
    pub gap_variation_factor: f32,
    /// Extra damping on the random walk step
    pub gap_dampening: f32,
    /// Scroll speed at score 0 (px/tick)
    pub initial_scroll_speed: f32,
    pub max_scroll_speed: f32,
    /// Scroll speed gain per score point
    pub speed_increase_rate: f32,
    /// Ticks between spawns at score 0
    pub initial_spawn_interval: u32,
    pub min_spawn_interval: u32,
    /// Spawn interval reduction (ticks) per score point
    pub spawn_interval_decay: f32,

    // === Collision ===
    /// Grace window granted at the start of every run (ticks)
    pub invincibility_ticks: u32,
    /// How long a registered hit keeps the flash active (ticks)
    pub flash_ticks: u32,

    // === Scoring ===
    pub base_points: f64,
    /// Decimal places kept when rounding awarded points
    pub score_decimals: u32,
    /// Consecutive clears per multiplier step
    pub combo_threshold: u32,
    pub multiplier_step: f64,
    pub max_multiplier: f64,
    /// Inactivity window before a combo expires (ms)
    pub combo_window_ms: f64,

    // === Determinism ===
    pub seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_width: 480.0,
            screen_height: 640.0,

            actor_x: 120.0,
            actor_start_y: 320.0,
            actor_radius: 15.0,
            hitbox_tolerance: 2.0,

            gravity: 0.6,
            air_resistance: 0.98,
            terminal_up: -12.0,
            terminal_down: 12.0,
            impulse_strength: -10.0,
            momentum_conservation: 0.95,
            rising_blend: 0.3,
            falling_blend: 0.2,
            position_smoothing: 0.15,
            velocity_history_len: 5,
            rotation_factor: 0.08,
            max_rotation: std::f32::consts::FRAC_PI_4,

            obstacle_width: 70.0,
            initial_gap_height: 200.0,
            min_gap_height: 120.0,
            gap_shrink_rate: 2.0,
            min_gap_y: 160.0,
            max_gap_y: 480.0,
            gap_variation_factor: 0.6,
            gap_dampening: 0.75,
            initial_scroll_speed: 3.0,
            max_scroll_speed: 6.0,
            speed_increase_rate: 0.05,
            initial_spawn_interval: 100,
            min_spawn_interval: 60,
            spawn_interval_decay: 0.5,

            invincibility_ticks: 30,
            flash_ticks: 12,

            base_points: 1.0,
            score_decimals: 1,
            combo_threshold: 3,
            multiplier_step: 0.5,
            max_multiplier: 10.0,
            combo_window_ms: 3000.0,

            seed: 0x5EED_F1A9,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Check cross-field constraints the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        let floats = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("actor_x", self.actor_x),
            ("actor_start_y", self.actor_start_y),
            ("actor_radius", self.actor_radius),
            ("hitbox_tolerance", self.hitbox_tolerance),
            ("gravity", self.gravity),
            ("terminal_up", self.terminal_up),
            ("terminal_down", self.terminal_down),
            ("impulse_strength", self.impulse_strength),
            ("rotation_factor", self.rotation_factor),
            ("max_rotation", self.max_rotation),
            ("obstacle_width", self.obstacle_width),
            ("initial_gap_height", self.initial_gap_height),
            ("min_gap_height", self.min_gap_height),
            ("gap_shrink_rate", self.gap_shrink_rate),
            ("min_gap_y", self.min_gap_y),
            ("max_gap_y", self.max_gap_y),
            ("gap_variation_factor", self.gap_variation_factor),
            ("initial_scroll_speed", self.initial_scroll_speed),
            ("max_scroll_speed", self.max_scroll_speed),
            ("speed_increase_rate", self.speed_increase_rate),
            ("spawn_interval_decay", self.spawn_interval_decay),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        let doubles = [
            ("base_points", self.base_points),
            ("multiplier_step", self.multiplier_step),
            ("max_multiplier", self.max_multiplier),
            ("combo_window_ms", self.combo_window_ms),
        ];
        for (field, value) in doubles {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be finite and non-negative"));
            }
        }

        let unit = [
            ("air_resistance", self.air_resistance),
            ("momentum_conservation", self.momentum_conservation),
            ("rising_blend", self.rising_blend),
            ("falling_blend", self.falling_blend),
            ("position_smoothing", self.position_smoothing),
            ("gap_dampening", self.gap_dampening),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be within 0..=1"));
            }
        }

        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err(invalid("screen_height", "playfield must have positive size"));
        }
        if self.terminal_up >= 0.0 {
            return Err(invalid("terminal_up", "must be negative"));
        }
        if self.terminal_down <= 0.0 {
            return Err(invalid("terminal_down", "must be positive"));
        }
        // Worst case: flapping while at terminal fall speed
        let worst_flap = self.impulse_strength
            + self.terminal_down * self.falling_blend * self.momentum_conservation;
        if worst_flap >= 0.0 {
            return Err(invalid(
                "impulse_strength",
                "must stay upward even at terminal fall speed",
            ));
        }
        if self.hitbox_tolerance < 0.0 || self.hitbox_tolerance >= self.actor_radius {
            return Err(invalid("hitbox_tolerance", "must be within 0..actor_radius"));
        }
        if self.max_rotation < 0.0 {
            return Err(invalid("max_rotation", "must be non-negative"));
        }
        if self.velocity_history_len == 0 {
            return Err(invalid("velocity_history_len", "must be at least 1"));
        }

        if self.min_gap_height <= 0.0 || self.min_gap_height > self.initial_gap_height {
            return Err(invalid("min_gap_height", "must be within 0..=initial_gap_height"));
        }
        if self.min_gap_y > self.max_gap_y {
            return Err(invalid("min_gap_y", "must not exceed max_gap_y"));
        }
        let half_gap = self.initial_gap_height / 2.0;
        if self.min_gap_y - half_gap < 0.0 || self.max_gap_y + half_gap > self.screen_height {
            return Err(invalid("max_gap_y", "widest gap must stay on screen"));
        }
        if self.obstacle_width <= 0.0 {
            return Err(invalid("obstacle_width", "must be positive"));
        }
        if self.gap_shrink_rate < 0.0 || self.speed_increase_rate < 0.0 {
            return Err(invalid("gap_shrink_rate", "difficulty rates must be non-negative"));
        }
        if self.spawn_interval_decay < 0.0 {
            return Err(invalid("spawn_interval_decay", "must be non-negative"));
        }
        if self.initial_scroll_speed <= 0.0 || self.max_scroll_speed < self.initial_scroll_speed {
            return Err(invalid("max_scroll_speed", "must be at least initial_scroll_speed"));
        }
        if self.min_spawn_interval == 0 || self.min_spawn_interval > self.initial_spawn_interval {
            return Err(invalid(
                "min_spawn_interval",
                "must be within 1..=initial_spawn_interval",
            ));
        }

        if self.max_multiplier < 1.0 {
            return Err(invalid("max_multiplier", "must be at least 1"));
        }
        if self.combo_threshold == 0 {
            return Err(invalid("combo_threshold", "must be at least 1"));
        }
        if self.score_decimals > MAX_SCORE_DECIMALS {
            return Err(invalid("score_decimals", "must be at most 9"));
        }

        Ok(())
    }

    /// Centre of the allowed gap band, where the first gap of a run sits
    pub fn gap_midpoint(&self) -> f32 {
        (self.min_gap_y + self.max_gap_y) / 2.0
    }
}

/// Rounding scale `10^decimals` must stay well inside f64 precision
const MAX_SCORE_DECIMALS: u32 = 9;

fn invalid(field: &'static str, reason: &'static str) -> TuningError {
    TuningError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let tuning = Tuning::from_json(r#"{ "gravity": 0.5, "seed": 7 }"#).unwrap();
        assert!((tuning.gravity - 0.5).abs() < f32::EPSILON);
        assert_eq!(tuning.seed, 7);
        assert_eq!(tuning.combo_threshold, Tuning::default().combo_threshold);
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = Tuning::from_json("{ gravity: ").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_rejects_impulse_that_can_point_down() {
        let tuning = Tuning {
            impulse_strength: -1.0,
            falling_blend: 1.0,
            momentum_conservation: 1.0,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "impulse_strength",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_gap_bounds() {
        let tuning = Tuning {
            min_gap_y: 400.0,
            max_gap_y: 300.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = Tuning {
            min_gap_height: 250.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_gap_leaving_screen() {
        let tuning = Tuning {
            max_gap_y: 600.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let tuning = Tuning {
            gravity: f32::NAN,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_score_decimals() {
        let tuning = Tuning {
            score_decimals: 400,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "score_decimals",
                ..
            }
        ));

        let tuning = Tuning {
            score_decimals: MAX_SCORE_DECIMALS,
            ..Default::default()
        };
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let json = serde_json::to_string(&Tuning::default()).unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), Tuning::default());
    }
}
