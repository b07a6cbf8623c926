//! Active agents: state, spawn sampling and the death/respawn lifecycle.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ShoalConfig;
use crate::geometry::{Bounds, Vec2, lerp};
use crate::particle::ParticleId;

const FULL_TURN: f32 = std::f32::consts::TAU;

/// Lifecycle phase derived from `dead_at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum FishPhase {
    Alive,
    /// Struck and fading; `fade` runs from 1 down to 0.
    Dying { fade: f32 },
}

/// A fish agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fish {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Cruising speed before any flee boost (px/s).
    pub max_speed: f32,
    pub size: f32,
    pub color_mix: f32,
    /// Persistent random-walk heading (rad).
    pub wander: f32,
    /// Seconds until the next target search is allowed.
    pub cooldown: f32,
    /// Weak handle to the particle being pursued.
    #[serde(skip)]
    pub target: Option<ParticleId>,
    /// Host timestamp (ms) of the strike; `None` while alive.
    pub dead_at: Option<f64>,
}

impl Fish {
    /// Samples a freshly spawned fish somewhere inside `bounds`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds, config: &ShoalConfig) -> Self {
        let mut fish = Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            max_speed: 0.0,
            size: 0.0,
            color_mix: 0.0,
            wander: 0.0,
            cooldown: 0.0,
            target: None,
            dead_at: None,
        };
        fish.respawn(rng, bounds, config);
        fish
    }

    /// Re-rolls every attribute in place and clears the death marker.
    pub fn respawn<R: Rng + ?Sized>(&mut self, rng: &mut R, bounds: Bounds, config: &ShoalConfig) {
        let (size, speed) = sample_size_speed(rng, config);
        let drift = config.fish_spawn_drift;
        self.position = Vec2::new(
            rng.random_range(0.0..bounds.width),
            rng.random_range(0.0..bounds.height),
        );
        self.velocity = if drift > 0.0 {
            Vec2::new(
                rng.random_range(-drift..drift),
                rng.random_range(-drift..drift),
            )
        } else {
            Vec2::ZERO
        };
        self.size = size;
        self.max_speed = speed;
        self.color_mix = rng.random_range(0.0..1.0);
        self.wander = rng.random_range(0.0..FULL_TURN);
        self.cooldown = config.spawn_cooldown.sample(rng);
        self.target = None;
        self.dead_at = None;
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.dead_at.is_none()
    }

    /// Current phase at host time `now_ms`.
    #[must_use]
    pub fn phase(&self, now_ms: f64, fade_ms: f64) -> FishPhase {
        match self.dead_at {
            None => FishPhase::Alive,
            Some(dead_at) => {
                let age = (now_ms - dead_at).max(0.0);
                let fade = 1.0 - (age / fade_ms).min(1.0);
                FishPhase::Dying { fade: fade as f32 }
            }
        }
    }

    /// Radius within which a pointer press strikes this fish.
    #[must_use]
    pub fn hit_radius(&self, config: &ShoalConfig) -> f32 {
        config.hit_radius_min.max(self.size * config.hit_radius_factor)
    }

    /// Marks the fish as struck at `now_ms`.
    pub fn strike<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R, config: &ShoalConfig) {
        self.dead_at = Some(now_ms);
        self.target = None;
        self.cooldown = config.strike_cooldown.sample(rng);
        self.velocity *= config.strike_damping;
    }

    /// Respawns the fish once its fade has elapsed. Returns whether it respawned.
    pub fn revive_if_due<R: Rng + ?Sized>(
        &mut self,
        now_ms: f64,
        rng: &mut R,
        bounds: Bounds,
        config: &ShoalConfig,
    ) -> bool {
        match self.dead_at {
            Some(dead_at) if now_ms - dead_at >= config.death_fade_ms => {
                self.respawn(rng, bounds, config);
                true
            }
            _ => false,
        }
    }
}

/// Smaller fish are more common and swim faster.
fn sample_size_speed<R: Rng + ?Sized>(rng: &mut R, config: &ShoalConfig) -> (f32, f32) {
    let u: f32 = rng.random_range(0.0..1.0);
    let size = lerp(
        config.fish_size.min,
        config.fish_size.max,
        u.powf(config.fish_size_bias),
    );
    let base = config.fish_base_speed.sample(rng);
    let speed = (base * (config.fish_speed_reference_size / size)).clamp(
        config.fish_speed_limits.min,
        config.fish_speed_limits.max,
    );
    (size, speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn spawned_fish_respect_configured_ranges() {
        let config = ShoalConfig::default();
        let bounds = Bounds::new(1024.0, 768.0);
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..200 {
            let fish = Fish::random(&mut rng, bounds, &config);
            assert!(bounds.contains(fish.position));
            assert!(config.fish_size.contains(fish.size));
            assert!(config.fish_speed_limits.contains(fish.max_speed));
            assert!(config.spawn_cooldown.contains(fish.cooldown));
            assert!((0.0..FULL_TURN).contains(&fish.wander));
            assert!(fish.is_alive());
            assert!(fish.target.is_none());
        }
    }

    #[test]
    fn strike_dampens_and_schedules_cooldown() {
        let config = ShoalConfig::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut fish = Fish::random(&mut rng, Bounds::new(300.0, 300.0), &config);
        fish.velocity = Vec2::new(50.0, -20.0);
        fish.strike(1_000.0, &mut rng, &config);
        assert_eq!(fish.dead_at, Some(1_000.0));
        assert!((fish.velocity.x - 10.0).abs() < 1e-4);
        assert!((fish.velocity.y + 4.0).abs() < 1e-4);
        assert!(config.strike_cooldown.contains(fish.cooldown));
    }

    #[test]
    fn fade_runs_down_then_revives() {
        let config = ShoalConfig::default();
        let bounds = Bounds::new(300.0, 300.0);
        let mut rng = SmallRng::seed_from_u64(8);
        let mut fish = Fish::random(&mut rng, bounds, &config);
        fish.strike(2_000.0, &mut rng, &config);

        assert_eq!(fish.phase(2_000.0, 900.0), FishPhase::Dying { fade: 1.0 });
        match fish.phase(2_450.0, 900.0) {
            FishPhase::Dying { fade } => assert!((fade - 0.5).abs() < 1e-6),
            FishPhase::Alive => panic!("fish should still be dying"),
        }

        assert!(!fish.revive_if_due(2_899.0, &mut rng, bounds, &config));
        assert!(!fish.is_alive());
        assert!(fish.revive_if_due(2_900.0, &mut rng, bounds, &config));
        assert!(fish.is_alive());
        assert_eq!(fish.phase(2_900.0, 900.0), FishPhase::Alive);
    }

    #[test]
    fn hit_radius_has_a_floor() {
        let config = ShoalConfig::default();
        let mut fish = Fish::random(&mut SmallRng::seed_from_u64(1), Bounds::default(), &config);
        fish.size = 5.0;
        assert_eq!(fish.hit_radius(&config), 18.0);
        fish.size = 20.0;
        assert!((fish.hit_radius(&config) - 42.0).abs() < 1e-4);
    }
}
