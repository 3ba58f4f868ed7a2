//! Obstacle pairs and difficulty scaling
//!
//! Obstacles scroll left at the current speed, spawn on a tick cadence and
//! retire once fully off-screen. Gap centres follow a damped random walk so
//! consecutive gaps never jump between extremes.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::EntityId;
use crate::tuning::Tuning;

/// A top/bottom obstacle pair sharing one gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    /// Left edge
    pub x: f32,
    pub width: f32,
    pub gap_center_y: f32,
    pub gap_height: f32,
    /// Set once the actor has passed it; never unset
    pub cleared: bool,
}

impl Obstacle {
    /// Bottom edge of the top obstacle
    #[inline]
    pub fn top_edge(&self) -> f32 {
        self.gap_center_y - self.gap_height / 2.0
    }

    /// Top edge of the bottom obstacle
    #[inline]
    pub fn bottom_edge(&self) -> f32 {
        self.gap_center_y + self.gap_height / 2.0
    }

    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }
}

/// Difficulty derived from score; never set directly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub scroll_speed: f32,
    pub gap_height: f32,
    /// Ticks between spawns
    pub spawn_interval: u32,
}

impl DifficultyState {
    /// Monotonic, clamped difficulty curve. Plateaus so endless runs stay
    /// playable.
    pub fn for_score(tuning: &Tuning, score: f64) -> Self {
        let s = if score.is_finite() {
            score.max(0.0) as f32
        } else {
            0.0
        };

        let gap_height = (tuning.initial_gap_height - s * tuning.gap_shrink_rate)
            .max(tuning.min_gap_height)
            .min(tuning.initial_gap_height);
        let scroll_speed = (tuning.initial_scroll_speed + s * tuning.speed_increase_rate)
            .min(tuning.max_scroll_speed)
            .max(tuning.initial_scroll_speed);
        let interval = tuning.initial_spawn_interval as f32 - s * tuning.spawn_interval_decay;
        // max/min rather than clamp: an unvalidated tuning may invert the bounds
        let spawn_interval = (interval.round().max(0.0) as u32)
            .max(tuning.min_spawn_interval)
            .min(tuning.initial_spawn_interval);

        Self {
            scroll_speed,
            gap_height,
            spawn_interval,
        }
    }
}

/// Summary for HUDs and debugging
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyStats {
    pub difficulty: DifficultyState,
    pub active_obstacles: usize,
    pub spawned_total: u64,
    pub last_gap_y: f32,
}

/// Result of one generator step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub spawned: Vec<EntityId>,
    pub retired: Vec<EntityId>,
}

/// Creates, scrolls and retires obstacles
#[derive(Debug, Clone)]
pub struct ObstacleGenerator {
    tuning: Tuning,
    rng: Pcg32,
    /// Active obstacles in spawn order
    obstacles: Vec<Obstacle>,
    difficulty: DifficultyState,
    spawn_timer: u32,
    last_gap_y: f32,
    next_id: EntityId,
    spawned_total: u64,
}

/// Obstacle ids start above the actor range
const FIRST_OBSTACLE_ID: EntityId = 1000;

impl ObstacleGenerator {
    /// Expects a tuning that passed [`Tuning::validate`]; bounds are not
    /// re-checked here.
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.clone(),
            rng: Pcg32::seed_from_u64(tuning.seed),
            obstacles: Vec::new(),
            difficulty: DifficultyState::for_score(tuning, 0.0),
            spawn_timer: 0,
            last_gap_y: tuning.gap_midpoint(),
            next_id: FIRST_OBSTACLE_ID,
            spawned_total: 0,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn difficulty(&self) -> DifficultyState {
        self.difficulty
    }

    /// Spawn a new obstacle at the right edge of the screen
    pub fn spawn(&mut self) -> EntityId {
        let t = &self.tuning;
        let range = t.max_gap_y - t.min_gap_y;
        let max_step = range * t.gap_variation_factor * t.gap_dampening;
        let variation = (self.rng.random::<f32>() - 0.5) * 2.0 * max_step;
        let gap_center_y = (self.last_gap_y + variation).clamp(t.min_gap_y, t.max_gap_y);

        let id = self.next_id;
        self.next_id += 1;
        self.spawned_total += 1;
        self.last_gap_y = gap_center_y;

        let obstacle = Obstacle {
            id,
            x: t.screen_width,
            width: t.obstacle_width,
            gap_center_y,
            gap_height: self.difficulty.gap_height,
            cleared: false,
        };
        log::debug!(
            "Spawned obstacle {} gap_y={:.1} gap_h={:.1}",
            id,
            obstacle.gap_center_y,
            obstacle.gap_height
        );
        self.obstacles.push(obstacle);
        id
    }

    /// Scroll, retire off-screen obstacles and spawn on cadence
    pub fn step(&mut self, scroll_speed_override: Option<f32>) -> StepReport {
        let speed = scroll_speed_override
            .filter(|s| s.is_finite())
            .unwrap_or(self.difficulty.scroll_speed);

        for obstacle in &mut self.obstacles {
            obstacle.x -= speed;
        }

        let mut report = StepReport::default();
        // retain keeps relative order
        self.obstacles.retain(|o| {
            let on_screen = o.trailing_edge() >= 0.0;
            if !on_screen {
                report.retired.push(o.id);
            }
            on_screen
        });
        for id in &report.retired {
            log::debug!("Retired obstacle {id}");
        }

        self.spawn_timer += 1;
        if self.spawn_timer >= self.difficulty.spawn_interval {
            self.spawn_timer = 0;
            report.spawned.push(self.spawn());
        }

        report
    }

    /// Recompute the difficulty curve for `score`
    pub fn update_difficulty(&mut self, score: f64) {
        let next = DifficultyState::for_score(&self.tuning, score);
        if next != self.difficulty {
            log::debug!(
                "Difficulty: speed={:.2} gap={:.1} interval={}",
                next.scroll_speed,
                next.gap_height,
                next.spawn_interval
            );
        }
        self.difficulty = next;
    }

    /// Uncleared obstacles whose trailing edge is already behind `actor_x`,
    /// in spawn order
    pub fn passed_uncleared(&self, actor_x: f32) -> Vec<EntityId> {
        self.obstacles
            .iter()
            .filter(|o| !o.cleared && o.trailing_edge() < actor_x)
            .map(|o| o.id)
            .collect()
    }

    /// Mark one obstacle cleared. Returns false if it was already cleared or
    /// is not active.
    pub fn mark_cleared(&mut self, id: EntityId) -> bool {
        match self.obstacles.iter_mut().find(|o| o.id == id) {
            Some(o) if !o.cleared => {
                o.cleared = true;
                true
            }
            _ => false,
        }
    }

    /// First obstacle the actor has not yet passed
    pub fn next_uncleared(&self) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| !o.cleared)
    }

    /// Back to an empty field at base difficulty. The RNG stream continues.
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.spawn_timer = 0;
        self.last_gap_y = self.tuning.gap_midpoint();
        self.difficulty = DifficultyState::for_score(&self.tuning, 0.0);
    }

    pub fn get_difficulty_stats(&self) -> DifficultyStats {
        DifficultyStats {
            difficulty: self.difficulty,
            active_obstacles: self.obstacles.len(),
            spawned_total: self.spawned_total,
            last_gap_y: self.last_gap_y,
        }
    }
}
