//! Steering forces and the velocity/position integrator.

use rand::Rng;

use crate::config::ShoalConfig;
use crate::fish::Fish;
use crate::geometry::{Bounds, Vec2};

/// Below this planar distance the pointer gives no usable direction.
const MIN_REPEL_DISTANCE: f32 = 0.001;

/// Outcome of the steering stage for one fish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Unit heading the fish wants to swim along (zero if undecided).
    pub direction: Vec2,
    /// Raw pointer avoidance contribution, before normalization.
    pub repel: Vec2,
    /// Multiplier on the fish's cruising speed.
    pub speed_boost: f32,
}

impl Steering {
    /// Speed cap for this tick.
    #[must_use]
    pub fn speed_limit(&self, fish: &Fish) -> f32 {
        fish.max_speed * self.speed_boost
    }
}

/// Sums seek, pointer avoidance and wander into a desired heading.
///
/// `target_delta` is the toroidal displacement to the held target and
/// `pointer` the surface-local pointer position when it is active. Advances
/// the fish's wander heading as a side effect.
pub fn steer<R: Rng + ?Sized>(
    fish: &mut Fish,
    target_delta: Option<Vec2>,
    pointer: Option<Vec2>,
    dt: f32,
    rng: &mut R,
    config: &ShoalConfig,
) -> Steering {
    let mut accel = Vec2::ZERO;

    if let Some(delta) = target_delta {
        accel += delta.normalize_or_zero() * config.seek_weight;
    }

    let mut repel = Vec2::ZERO;
    let mut speed_boost = 1.0;
    if let Some(pointer) = pointer {
        let away = fish.position - pointer;
        let dist = away.length();
        if dist < config.repel_radius {
            speed_boost = config.flee_boost;
            if dist > MIN_REPEL_DISTANCE {
                let strength = (1.0 - dist / config.repel_radius) * config.repel_strength;
                repel = away * (strength / dist);
            }
        }
    }
    accel += repel;

    let turn = config.wander_turn_rate;
    if turn > 0.0 {
        fish.wander += rng.random_range(-turn..turn) * dt;
    }
    accel += Vec2::from_angle(fish.wander) * config.wander_weight;

    Steering {
        direction: accel.normalize_or_zero(),
        repel,
        speed_boost,
    }
}

/// Eases velocity toward the desired heading, caps speed, moves and wraps.
pub fn integrate(fish: &mut Fish, steering: &Steering, dt: f32, bounds: Bounds, config: &ShoalConfig) {
    let limit = steering.speed_limit(fish);
    let desired = steering.direction * limit;
    let blend = 1.0 - (-config.steer_rate * dt).exp();
    fish.velocity += (desired - fish.velocity) * blend;
    fish.velocity = fish.velocity.clamp_length(limit);
    fish.position = bounds.wrap(fish.position + fish.velocity * dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn still_fish(x: f32, y: f32) -> Fish {
        let config = ShoalConfig::default();
        let mut fish = Fish::random(&mut SmallRng::seed_from_u64(2), Bounds::new(800.0, 600.0), &config);
        fish.position = Vec2::new(x, y);
        fish.velocity = Vec2::ZERO;
        fish.max_speed = 60.0;
        fish
    }

    #[test]
    fn pointer_inside_repel_radius_pushes_away_and_boosts() {
        let config = ShoalConfig {
            wander_weight: 0.0,
            ..ShoalConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(9);
        let mut fish = still_fish(200.0, 200.0);
        let steering = steer(&mut fish, None, Some(Vec2::new(150.0, 200.0)), 0.025, &mut rng, &config);

        assert_eq!(steering.speed_boost, 1.35);
        assert!((steering.speed_limit(&fish) - 81.0).abs() < 1e-4);
        // 50px away: (1 - 50/140) * 2.2 along +x.
        let expected = (1.0 - 50.0 / 140.0) * 2.2;
        assert!((steering.repel.x - expected).abs() < 1e-5);
        assert!(steering.repel.y.abs() < 1e-6);
        assert!((steering.direction.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pointer_outside_radius_is_ignored() {
        let config = ShoalConfig::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut fish = still_fish(400.0, 200.0);
        let steering = steer(&mut fish, None, Some(Vec2::new(100.0, 200.0)), 0.025, &mut rng, &config);
        assert_eq!(steering.speed_boost, 1.0);
        assert_eq!(steering.repel, Vec2::ZERO);
    }

    #[test]
    fn wander_drift_is_bounded_by_turn_rate() {
        let config = ShoalConfig::default();
        let mut rng = SmallRng::seed_from_u64(77);
        let mut fish = still_fish(10.0, 10.0);
        for _ in 0..100 {
            let before = fish.wander;
            steer(&mut fish, None, None, 0.05, &mut rng, &config);
            assert!((fish.wander - before).abs() <= 1.15 * 0.05 + 1e-6);
        }
    }

    #[test]
    fn integrate_smooths_and_caps_speed() {
        let config = ShoalConfig::default();
        let mut fish = still_fish(10.0, 10.0);
        fish.velocity = Vec2::new(0.0, 500.0);
        let steering = Steering {
            direction: Vec2::new(1.0, 0.0),
            repel: Vec2::ZERO,
            speed_boost: 1.0,
        };
        integrate(&mut fish, &steering, 0.05, Bounds::new(800.0, 600.0), &config);
        assert!(fish.velocity.length() <= 60.0 + 1e-3);
        assert!(fish.velocity.x > 0.0);
    }

    #[test]
    fn integrate_wraps_position() {
        let config = ShoalConfig::default();
        let mut fish = still_fish(799.5, 0.2);
        fish.velocity = Vec2::new(60.0, -60.0);
        let steering = Steering {
            direction: Vec2::new(1.0, -1.0).normalize_or_zero(),
            repel: Vec2::ZERO,
            speed_boost: 1.0,
        };
        integrate(&mut fish, &steering, 0.05, Bounds::new(800.0, 600.0), &config);
        assert!(fish.position.x < 10.0);
        assert!(fish.position.y > 590.0);
    }
}
