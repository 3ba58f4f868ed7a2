//! Score, combo and multiplier
//!
//! Consecutive clears inside the combo window build a streak; every
//! `combo_threshold` clears raise the multiplier by one step (capped).
//! The streak decays only with inactivity.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Non-negative, rounded to the configured precision
    pub score: f64,
    pub combo_count: u32,
    /// Always within 1..=max_multiplier
    pub multiplier: f64,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            score: 0.0,
            combo_count: 0,
            multiplier: 1.0,
        }
    }
}

/// What a single clear changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreChange {
    pub points: f64,
    pub state: ScoreState,
    pub multiplier_increased: bool,
}

#[derive(Debug, Clone)]
pub struct ScoreEngine {
    base_points: f64,
    decimals: u32,
    combo_threshold: u32,
    multiplier_step: f64,
    max_multiplier: f64,
    combo_window_ms: f64,
    state: ScoreState,
    last_clear_ms: Option<f64>,
}

impl ScoreEngine {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            base_points: tuning.base_points,
            decimals: tuning.score_decimals,
            combo_threshold: tuning.combo_threshold.max(1),
            multiplier_step: tuning.multiplier_step,
            max_multiplier: tuning.max_multiplier.max(1.0),
            combo_window_ms: tuning.combo_window_ms,
            state: ScoreState::default(),
            last_clear_ms: None,
        }
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    /// Whole-number score for submission
    pub fn final_score(&self) -> u64 {
        self.state.score.round() as u64
    }

    /// Award points for one cleared obstacle at simulation time `now_ms`
    pub fn on_obstacle_cleared(&mut self, now_ms: f64) -> ScoreChange {
        let s = &mut self.state;
        s.combo_count += 1;

        let mut multiplier_increased = false;
        if s.combo_count % self.combo_threshold == 0 && s.multiplier < self.max_multiplier {
            s.multiplier = (s.multiplier + self.multiplier_step).min(self.max_multiplier);
            multiplier_increased = true;
        }

        let points = round_to(self.base_points * s.multiplier, self.decimals);
        s.score = round_to(s.score + points, self.decimals);
        self.last_clear_ms = Some(now_ms);

        ScoreChange {
            points,
            state: *s,
            multiplier_increased,
        }
    }

    /// Drop the streak once the window since the last clear has elapsed.
    /// Returns true if a combo expired.
    pub fn update_combo_timeout(&mut self, now_ms: f64) -> bool {
        let Some(last) = self.last_clear_ms else {
            return false;
        };
        if self.state.combo_count == 0 || now_ms - last <= self.combo_window_ms {
            return false;
        }
        log::debug!(
            "Combo of {} expired (x{:.1})",
            self.state.combo_count,
            self.state.multiplier
        );
        self.state.combo_count = 0;
        self.state.multiplier = 1.0;
        true
    }

    pub fn reset(&mut self) {
        self.state = ScoreState::default();
        self.last_clear_ms = None;
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoreEngine {
        ScoreEngine::new(&Tuning::default())
    }

    #[test]
    fn test_multiplier_steps_every_threshold() {
        let mut e = engine();
        let first = e.on_obstacle_cleared(0.0);
        assert_eq!(first.points, 1.0);
        e.on_obstacle_cleared(100.0);
        let third = e.on_obstacle_cleared(200.0);
        assert!(third.multiplier_increased);
        assert_eq!(third.state.multiplier, 1.5);

        let fourth = e.on_obstacle_cleared(300.0);
        assert!(fourth.points > 1.0);
        assert_eq!(fourth.state.combo_count, 4);
    }

    #[test]
    fn test_multiplier_is_capped() {
        let mut e = engine();
        for i in 0..200 {
            e.on_obstacle_cleared(i as f64 * 10.0);
        }
        assert_eq!(e.state().multiplier, 10.0);
    }

    #[test]
    fn test_points_are_rounded_not_truncated() {
        let tuning = Tuning {
            base_points: 1.0,
            multiplier_step: 0.25,
            score_decimals: 1,
            combo_threshold: 1,
            ..Default::default()
        };
        let mut e = ScoreEngine::new(&tuning);
        // 1.25 rounds to 1.3
        let change = e.on_obstacle_cleared(0.0);
        assert_eq!(change.points, 1.3);
        assert_eq!(e.state().score, 1.3);
    }

    #[test]
    fn test_combo_times_out() {
        let mut e = engine();
        for i in 0..3 {
            e.on_obstacle_cleared(i as f64 * 100.0);
        }
        assert!(!e.update_combo_timeout(3200.0));
        assert!(e.update_combo_timeout(3201.0));
        let s = e.state();
        assert_eq!(s.combo_count, 0);
        assert_eq!(s.multiplier, 1.0);
        // 1 + 1 + 1.5, kept after the streak ends
        assert_eq!(s.score, 3.5);
        assert!(!e.update_combo_timeout(10_000.0));
    }

    #[test]
    fn test_no_timeout_without_clears() {
        let mut e = engine();
        assert!(!e.update_combo_timeout(1e9));
    }

    #[test]
    fn test_reset() {
        let mut e = engine();
        e.on_obstacle_cleared(0.0);
        e.reset();
        assert_eq!(e.state(), ScoreState::default());
        assert_eq!(e.final_score(), 0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.346, 2), 2.35);
        assert_eq!(round_to(2.04, 1), 2.0);
        assert_eq!(round_to(7.6, 0), 8.0);
    }
}
