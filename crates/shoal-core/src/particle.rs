//! Passive drifting food particles held in a fixed-size generational pool.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::config::ShoalConfig;
use crate::geometry::{Bounds, Vec2};

new_key_type! {
    /// Generational handle to a particle slot.
    ///
    /// Respawning a particle retires its handle; holders of the old handle
    /// observe a failed lookup instead of silently following the new particle.
    pub struct ParticleId;
}

/// A single food particle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub alpha: f32,
    /// Interpolation factor between the two accent colours, in `[0, 1)`.
    pub color_mix: f32,
}

impl Particle {
    /// Samples a fresh particle somewhere inside `bounds`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds, config: &ShoalConfig) -> Self {
        let drift = config.particle_drift;
        Self {
            position: Vec2::new(
                rng.random_range(0.0..bounds.width),
                rng.random_range(0.0..bounds.height),
            ),
            velocity: Vec2::new(symmetric(rng, drift), symmetric(rng, drift)),
            size: config.particle_size.sample(rng),
            alpha: config.particle_alpha.sample(rng),
            color_mix: rng.random_range(0.0..1.0),
        }
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.random_range(-extent..extent)
    } else {
        0.0
    }
}

/// Fixed-size particle pool.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    slots: SlotMap<ParticleId, Particle>,
}

impl ParticlePool {
    /// Seeds `count` random particles.
    pub fn seeded<R: Rng + ?Sized>(
        count: usize,
        rng: &mut R,
        bounds: Bounds,
        config: &ShoalConfig,
    ) -> Self {
        let mut slots = SlotMap::with_capacity_and_key(count);
        for _ in 0..count {
            slots.insert(Particle::random(rng, bounds, config));
        }
        Self { slots }
    }

    /// Builds a pool from explicit particles (handy for scripted scenarios).
    #[must_use]
    pub fn from_particles(particles: impl IntoIterator<Item = Particle>) -> Self {
        let mut slots = SlotMap::with_key();
        for particle in particles {
            slots.insert(particle);
        }
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up a particle; returns `None` for a retired handle.
    #[must_use]
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: ParticleId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.slots.iter()
    }

    /// Advances every particle by `dt` seconds and wraps it back onto the torus.
    pub fn integrate(&mut self, dt: f32, bounds: Bounds) {
        for particle in self.slots.values_mut() {
            particle.position = bounds.wrap(particle.position + particle.velocity * dt);
        }
    }

    /// Reinitializes the particle in place, returning its new handle.
    ///
    /// The slot is reused so the pool size is unchanged, but the generation is
    /// bumped so `id` itself no longer resolves.
    pub fn respawn<R: Rng + ?Sized>(
        &mut self,
        id: ParticleId,
        rng: &mut R,
        bounds: Bounds,
        config: &ShoalConfig,
    ) -> Option<ParticleId> {
        self.slots.remove(id)?;
        Some(self.slots.insert(Particle::random(rng, bounds, config)))
    }
}
