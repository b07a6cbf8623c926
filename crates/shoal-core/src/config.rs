//! Tunable constants for the shoal engine.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ShoalError;
use crate::geometry::Bounds;

/// Sampling range; draws land in `[min, max)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws a uniform sample; a degenerate span always yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Number of entities to seed for a given viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolSizes {
    pub particles: usize,
    pub fish: usize,
}

/// Static configuration for a shoal world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShoalConfig {
    /// Viewport area (px²) per food particle before clamping.
    pub particle_area_divisor: f32,
    /// Lower bound on the particle pool size.
    pub particle_count_min: usize,
    /// Upper bound on the particle pool size.
    pub particle_count_max: usize,
    /// Viewport area (px²) per fish before clamping.
    pub fish_area_divisor: f32,
    /// Lower bound on the fish pool size.
    pub fish_count_min: usize,
    /// Upper bound on the fish pool size.
    pub fish_count_max: usize,

    /// Absolute bound on each particle velocity component (px/s).
    pub particle_drift: f32,
    /// Particle dot radius range.
    pub particle_size: Span,
    /// Particle opacity range.
    pub particle_alpha: Span,

    /// Fish body size range; samples are biased toward `min`.
    pub fish_size: Span,
    /// Exponent applied to the uniform sample before interpolating the size.
    pub fish_size_bias: f32,
    /// Base cruising speed range before size scaling (px/s).
    pub fish_base_speed: Span,
    /// Body size at which the base speed applies unscaled.
    pub fish_speed_reference_size: f32,
    /// Final cruising speed is clamped into this range.
    pub fish_speed_limits: Span,
    /// Absolute bound on each initial fish velocity component (px/s).
    pub fish_spawn_drift: f32,
    /// Cooldown assigned to freshly spawned fish (s).
    pub spawn_cooldown: Span,

    /// Radius within which a fish may acquire a new target (px).
    pub seek_radius: f32,
    /// Radius beyond which a held target is released (px).
    pub keep_radius: f32,
    /// Distance at which a target is eaten (px).
    pub eat_radius: f32,
    /// Radius of pointer avoidance (px).
    pub repel_radius: f32,

    /// Weight of the seek component.
    pub seek_weight: f32,
    /// Peak strength of pointer avoidance at zero distance.
    pub repel_strength: f32,
    /// Weight of the wander component.
    pub wander_weight: f32,
    /// Maximum wander heading drift (rad/s).
    pub wander_turn_rate: f32,
    /// Heading perturbation applied after eating (rad).
    pub eat_wander_kick: f32,
    /// Speed multiplier while fleeing the pointer.
    pub flee_boost: f32,
    /// Exponential smoothing rate for velocity (1/s).
    pub steer_rate: f32,
    /// Cooldown after eating (s).
    pub eat_cooldown: Span,

    /// Hit radius as a multiple of fish size.
    pub hit_radius_factor: f32,
    /// Minimum hit radius (px).
    pub hit_radius_min: f32,
    /// Duration of the death fade (ms).
    pub death_fade_ms: f64,
    /// Velocity multiplier applied to a struck fish.
    pub strike_damping: f32,
    /// Cooldown assigned on strike so a respawned fish does not seek immediately (s).
    pub strike_cooldown: Span,

    /// Processing rate cap (frames per second).
    pub target_fps: f64,
    /// Upper bound on the integration step (s).
    pub max_dt: f32,

    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
}

impl Default for ShoalConfig {
    fn default() -> Self {
        Self {
            particle_area_divisor: 15_000.0,
            particle_count_min: 110,
            particle_count_max: 170,
            fish_area_divisor: 260_000.0,
            fish_count_min: 8,
            fish_count_max: 12,
            particle_drift: 10.0,
            particle_size: Span::new(1.1, 2.1),
            particle_alpha: Span::new(0.18, 0.5),
            fish_size: Span::new(10.0, 24.0),
            fish_size_bias: 1.75,
            fish_base_speed: Span::new(52.0, 78.0),
            fish_speed_reference_size: 15.0,
            fish_speed_limits: Span::new(38.0, 95.0),
            fish_spawn_drift: 24.0,
            spawn_cooldown: Span::new(0.0, 0.9),
            seek_radius: 220.0,
            keep_radius: 320.0,
            eat_radius: 14.0,
            repel_radius: 140.0,
            seek_weight: 1.05,
            repel_strength: 2.2,
            wander_weight: 0.26,
            wander_turn_rate: 1.15,
            eat_wander_kick: 1.0,
            flee_boost: 1.35,
            steer_rate: 8.0,
            eat_cooldown: Span::new(0.6, 1.2),
            hit_radius_factor: 2.1,
            hit_radius_min: 18.0,
            death_fade_ms: 900.0,
            strike_damping: 0.2,
            strike_cooldown: Span::new(1.1, 1.9),
            target_fps: 40.0,
            max_dt: 0.05,
            rng_seed: None,
        }
    }
}

impl ShoalConfig {
    /// Checks internal consistency of every tunable.
    pub fn validate(&self) -> Result<(), ShoalError> {
        if !(self.particle_area_divisor > 0.0 && self.fish_area_divisor > 0.0) {
            return Err(ShoalError::InvalidConfig(
                "area divisors must be positive",
            ));
        }
        if self.particle_count_min > self.particle_count_max
            || self.fish_count_min > self.fish_count_max
        {
            return Err(ShoalError::InvalidConfig(
                "pool size minimums cannot exceed maximums",
            ));
        }
        if !self.particle_size.is_ordered()
            || !self.particle_alpha.is_ordered()
            || !self.fish_size.is_ordered()
            || !self.fish_base_speed.is_ordered()
            || !self.fish_speed_limits.is_ordered()
            || !self.spawn_cooldown.is_ordered()
            || !self.eat_cooldown.is_ordered()
            || !self.strike_cooldown.is_ordered()
        {
            return Err(ShoalError::InvalidConfig(
                "sampling ranges must be finite with min <= max",
            ));
        }
        if self.fish_size.min <= 0.0 || self.fish_speed_reference_size <= 0.0 {
            return Err(ShoalError::InvalidConfig("fish sizes must be positive"));
        }
        if self.particle_drift < 0.0 || self.fish_spawn_drift < 0.0 {
            return Err(ShoalError::InvalidConfig(
                "drift bounds must be non-negative",
            ));
        }
        if self.seek_radius <= 0.0
            || self.keep_radius <= 0.0
            || self.eat_radius <= 0.0
            || self.repel_radius <= 0.0
        {
            return Err(ShoalError::InvalidConfig("radii must be positive"));
        }
        if self.keep_radius < self.seek_radius {
            return Err(ShoalError::InvalidConfig(
                "keep_radius must be at least seek_radius",
            ));
        }
        if self.steer_rate <= 0.0 || self.flee_boost <= 0.0 || self.wander_turn_rate < 0.0 {
            return Err(ShoalError::InvalidConfig(
                "steer_rate and flee_boost must be positive, wander_turn_rate non-negative",
            ));
        }
        if self.hit_radius_factor <= 0.0 || self.hit_radius_min < 0.0 {
            return Err(ShoalError::InvalidConfig(
                "hit radius parameters must be positive",
            ));
        }
        if !(self.death_fade_ms > 0.0) {
            return Err(ShoalError::InvalidConfig("death_fade_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&self.strike_damping) {
            return Err(ShoalError::InvalidConfig(
                "strike_damping must lie in [0, 1]",
            ));
        }
        if !(self.target_fps > 0.0) || !(self.max_dt > 0.0) {
            return Err(ShoalError::InvalidConfig(
                "target_fps and max_dt must be positive",
            ));
        }
        Ok(())
    }

    /// Derives pool sizes from the viewport area.
    #[must_use]
    pub fn pool_sizes(&self, bounds: Bounds) -> PoolSizes {
        let area = f64::from(bounds.area());
        PoolSizes {
            particles: scaled_count(
                area,
                f64::from(self.particle_area_divisor),
                self.particle_count_min,
                self.particle_count_max,
            ),
            fish: scaled_count(
                area,
                f64::from(self.fish_area_divisor),
                self.fish_count_min,
                self.fish_count_max,
            ),
        }
    }

    /// Minimum time between processed frames (ms).
    #[must_use]
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

fn scaled_count(area: f64, divisor: f64, min: usize, max: usize) -> usize {
    (area / divisor).clamp(min as f64, max as f64).round() as usize
}
