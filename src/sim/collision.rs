//! Collision detection against obstacles and screen bounds
//!
//! Checks are stateless geometry layered under one piece of state: an
//! invincibility counter that suppresses detection entirely while it runs.
//! Detected hits are registered (kind, tick, flash timer) independently of
//! invincibility.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacles::Obstacle;
use crate::finite_or_zero;
use crate::tuning::Tuning;

/// What the actor ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionKind {
    #[default]
    None,
    ObstacleTop,
    ObstacleBottom,
    Ceiling,
    Floor,
}

/// Outcome of a collision check (fresh every tick)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionOutcome {
    pub hit: bool,
    pub kind: CollisionKind,
    /// Contact point on the surface that was hit
    pub impact_point: Vec2,
}

impl CollisionOutcome {
    pub fn miss() -> Self {
        Self {
            hit: false,
            kind: CollisionKind::None,
            impact_point: Vec2::ZERO,
        }
    }

    fn hit(kind: CollisionKind, impact_point: Vec2) -> Self {
        Self {
            hit: true,
            kind,
            impact_point,
        }
    }
}

/// Circular hitbox, shrunk by the forgiveness tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub center: Vec2,
    pub radius: f32,
}

/// Last registered hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub kind: CollisionKind,
    pub tick: u64,
    pub point: Vec2,
}

/// Obstacle/boundary collision checks with a grace window
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    base_radius: f32,
    tolerance: f32,
    screen_height: f32,
    flash_duration: u32,
    invincible_ticks: u32,
    flash_ticks: u32,
    last_hit: Option<HitRecord>,
    /// Incremented by `update`; timestamps registered hits
    ticks: u64,
}

impl CollisionDetector {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            base_radius: tuning.actor_radius,
            tolerance: tuning.hitbox_tolerance,
            screen_height: tuning.screen_height,
            flash_duration: tuning.flash_ticks,
            invincible_ticks: 0,
            flash_ticks: 0,
            last_hit: None,
            ticks: 0,
        }
    }

    /// Hitbox centred on the actor. Non-finite coordinates are pinned to 0 so
    /// a degenerate pose can never slip through a check.
    pub fn get_hitbox(&self, actor_x: f32, actor_y: f32) -> Hitbox {
        if !actor_x.is_finite() || !actor_y.is_finite() {
            log::warn!("Non-finite hitbox position ({actor_x}, {actor_y}) pinned to 0");
        }
        Hitbox {
            center: Vec2::new(finite_or_zero(actor_x), finite_or_zero(actor_y)),
            radius: (self.base_radius - self.tolerance).max(0.0),
        }
    }

    /// Test against obstacles in spawn order; the first hit wins
    pub fn check_obstacle_collision(
        &mut self,
        actor_x: f32,
        actor_y: f32,
        obstacles: &[Obstacle],
    ) -> CollisionOutcome {
        if self.is_invincible() {
            return CollisionOutcome::miss();
        }
        let outcome = obstacle_hit(self.get_hitbox(actor_x, actor_y), obstacles);
        self.register(outcome);
        outcome
    }

    /// Test against the top and bottom of the screen
    pub fn check_boundary_collision(&mut self, actor_x: f32, actor_y: f32) -> CollisionOutcome {
        if self.is_invincible() {
            return CollisionOutcome::miss();
        }
        let outcome = boundary_hit(self.get_hitbox(actor_x, actor_y), self.screen_height);
        self.register(outcome);
        outcome
    }

    /// Obstacles first, then boundaries
    pub fn check(&mut self, actor_x: f32, actor_y: f32, obstacles: &[Obstacle]) -> CollisionOutcome {
        if self.is_invincible() {
            return CollisionOutcome::miss();
        }
        let hitbox = self.get_hitbox(actor_x, actor_y);
        let mut outcome = obstacle_hit(hitbox, obstacles);
        if !outcome.hit {
            outcome = boundary_hit(hitbox, self.screen_height);
        }
        self.register(outcome);
        log::trace!("Collision check at tick {}: {:?}", self.ticks, outcome.kind);
        outcome
    }

    fn register(&mut self, outcome: CollisionOutcome) {
        if !outcome.hit {
            return;
        }
        self.last_hit = Some(HitRecord {
            kind: outcome.kind,
            tick: self.ticks,
            point: outcome.impact_point,
        });
        self.flash_ticks = self.flash_duration;
    }

    pub fn activate_invincibility(&mut self, duration_ticks: u32) {
        self.invincible_ticks = duration_ticks;
    }

    /// Advance timers by one tick
    pub fn update(&mut self) {
        self.ticks += 1;
        self.invincible_ticks = self.invincible_ticks.saturating_sub(1);
        self.flash_ticks = self.flash_ticks.saturating_sub(1);
    }

    /// Only the flash timer; used while the run is over
    pub fn update_flash(&mut self) {
        self.flash_ticks = self.flash_ticks.saturating_sub(1);
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ticks > 0
    }

    pub fn invincible_ticks_remaining(&self) -> u32 {
        self.invincible_ticks
    }

    pub fn is_flash_active(&self) -> bool {
        self.flash_ticks > 0
    }

    pub fn last_hit(&self) -> Option<HitRecord> {
        self.last_hit
    }

    pub fn reset(&mut self) {
        self.invincible_ticks = 0;
        self.flash_ticks = 0;
        self.last_hit = None;
        self.ticks = 0;
    }
}

fn obstacle_hit(hitbox: Hitbox, obstacles: &[Obstacle]) -> CollisionOutcome {
    let Hitbox { center, radius: r } = hitbox;
    for obstacle in obstacles {
        let overlaps_x = center.x + r > obstacle.x && center.x - r < obstacle.trailing_edge();
        if !overlaps_x {
            continue;
        }
        let top = obstacle.top_edge();
        if center.y - r < top {
            return CollisionOutcome::hit(CollisionKind::ObstacleTop, Vec2::new(center.x, top));
        }
        let bottom = obstacle.bottom_edge();
        if center.y + r > bottom {
            return CollisionOutcome::hit(
                CollisionKind::ObstacleBottom,
                Vec2::new(center.x, bottom),
            );
        }
    }
    CollisionOutcome::miss()
}

fn boundary_hit(hitbox: Hitbox, screen_height: f32) -> CollisionOutcome {
    let Hitbox { center, radius: r } = hitbox;
    if center.y - r < 0.0 {
        CollisionOutcome::hit(CollisionKind::Ceiling, Vec2::new(center.x, 0.0))
    } else if center.y + r > screen_height {
        CollisionOutcome::hit(CollisionKind::Floor, Vec2::new(center.x, screen_height))
    } else {
        CollisionOutcome::miss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe(id: u32, x: f32, gap_center_y: f32) -> Obstacle {
        Obstacle {
            id,
            x,
            width: 70.0,
            gap_center_y,
            gap_height: 200.0,
            cleared: false,
        }
    }

    fn detector() -> CollisionDetector {
        CollisionDetector::new(&Tuning::default())
    }

    #[test]
    fn test_hitbox_applies_tolerance() {
        let hitbox = detector().get_hitbox(120.0, 300.0);
        assert_eq!(hitbox.radius, 13.0);
        assert_eq!(hitbox.center, Vec2::new(120.0, 300.0));
    }

    #[test]
    fn test_miss_inside_gap() {
        let mut d = detector();
        // Gap spans 200..400
        let result = d.check_obstacle_collision(120.0, 300.0, &[pipe(1, 100.0, 300.0)]);
        assert!(!result.hit);
        assert_eq!(result.kind, CollisionKind::None);
    }

    #[test]
    fn test_top_and_bottom_hits() {
        let mut d = detector();
        let obstacles = [pipe(1, 100.0, 300.0)];

        let top = d.check_obstacle_collision(120.0, 210.0, &obstacles);
        assert_eq!(top.kind, CollisionKind::ObstacleTop);
        assert_eq!(top.impact_point, Vec2::new(120.0, 200.0));

        let bottom = d.check_obstacle_collision(120.0, 390.0, &obstacles);
        assert_eq!(bottom.kind, CollisionKind::ObstacleBottom);
        assert_eq!(bottom.impact_point, Vec2::new(120.0, 400.0));
    }

    #[test]
    fn test_tolerance_forgives_graze() {
        let mut d = detector();
        // Sprite radius 15 would overlap the top edge at y=214, hitbox radius 13 doesn't
        let result = d.check_obstacle_collision(120.0, 214.0, &[pipe(1, 100.0, 300.0)]);
        assert!(!result.hit);
    }

    #[test]
    fn test_no_horizontal_overlap_no_hit() {
        let mut d = detector();
        // Obstacle starts just past the hitbox's right edge (120 + 13)
        let result = d.check_obstacle_collision(120.0, 100.0, &[pipe(1, 133.0, 300.0)]);
        assert!(!result.hit);
        // Obstacle's trailing edge just behind the hitbox's left edge (120 - 13)
        let result = d.check_obstacle_collision(120.0, 100.0, &[pipe(1, 37.0, 300.0)]);
        assert!(!result.hit);
    }

    #[test]
    fn test_first_obstacle_in_order_wins() {
        let mut d = detector();
        let obstacles = [pipe(1, 100.0, 450.0), pipe(2, 110.0, 150.0)];
        // y=300: top hit on first (top edge 350), bottom hit on second
        let result = d.check_obstacle_collision(120.0, 300.0, &obstacles);
        assert_eq!(result.kind, CollisionKind::ObstacleTop);
    }

    #[test]
    fn test_boundaries() {
        let mut d = detector();
        assert_eq!(d.check_boundary_collision(120.0, 10.0).kind, CollisionKind::Ceiling);
        assert_eq!(d.check_boundary_collision(120.0, 630.0).kind, CollisionKind::Floor);
        assert!(!d.check_boundary_collision(120.0, 320.0).hit);
    }

    #[test]
    fn test_invincibility_suppresses_everything() {
        let mut d = detector();
        d.activate_invincibility(2);
        assert!(d.is_invincible());
        assert!(!d.check_boundary_collision(120.0, -50.0).hit);
        assert!(!d.check_obstacle_collision(120.0, 0.0, &[pipe(1, 100.0, 300.0)]).hit);
        assert!(!d.check(120.0, 1000.0, &[]).hit);
        assert!(d.last_hit().is_none());

        d.update();
        assert!(d.is_invincible());
        d.update();
        assert!(!d.is_invincible());
        assert!(d.check(120.0, 1000.0, &[]).hit);
    }

    #[test]
    fn test_registration_survives_invincibility_toggle() {
        let mut d = detector();
        d.update();
        let result = d.check(120.0, 5.0, &[]);
        assert_eq!(result.kind, CollisionKind::Ceiling);
        assert!(d.is_flash_active());

        d.activate_invincibility(10);
        let record = d.last_hit().unwrap();
        assert_eq!(record.kind, CollisionKind::Ceiling);
        assert_eq!(record.tick, 1);
        assert!(d.is_flash_active());
    }

    #[test]
    fn test_flash_expires() {
        let mut d = detector();
        d.check(120.0, 5.0, &[]);
        for _ in 0..Tuning::default().flash_ticks {
            assert!(d.is_flash_active());
            d.update_flash();
        }
        assert!(!d.is_flash_active());
    }

    #[test]
    fn test_nan_position_is_a_hit() {
        let mut d = detector();
        let result = d.check(120.0, f32::NAN, &[]);
        assert!(result.hit);
        assert_eq!(result.kind, CollisionKind::Ceiling);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut d = detector();
        d.check(120.0, 5.0, &[]);
        d.activate_invincibility(5);
        d.reset();
        assert!(!d.is_invincible());
        assert!(!d.is_flash_active());
        assert!(d.last_hit().is_none());
    }
}
