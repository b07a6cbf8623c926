//! Exclusive nearest-target assignment between fish and particles.

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::config::ShoalConfig;
use crate::fish::Fish;
use crate::geometry::{Bounds, Vec2};
use crate::particle::{ParticleId, ParticlePool};

/// Particles held by some fish during the current tick.
///
/// Emptied at the start of every tick and refilled as fish are visited; it
/// carries no state between ticks.
#[derive(Debug, Default, Clone)]
pub struct ClaimSet {
    claimed: HashSet<ParticleId>,
}

impl ClaimSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every claim while keeping the allocation.
    pub fn begin_tick(&mut self) {
        self.claimed.clear();
    }

    /// Records a claim. Returns `false` if the particle was already claimed.
    pub fn claim(&mut self, id: ParticleId) -> bool {
        self.claimed.insert(id)
    }

    #[must_use]
    pub fn is_claimed(&self, id: ParticleId) -> bool {
        self.claimed.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Validates the fish's held target or acquires a new one.
///
/// Returns the toroidal displacement from the fish to its target for this
/// tick, or `None` when the fish has nothing to pursue.
pub fn resolve_target(
    fish: &mut Fish,
    particles: &ParticlePool,
    claims: &mut ClaimSet,
    bounds: Bounds,
    config: &ShoalConfig,
) -> Option<Vec2> {
    if let Some(id) = fish.target {
        // A retired handle means the particle was respawned since we locked on.
        match particles.get(id) {
            Some(particle) => {
                let delta = bounds.delta(fish.position, particle.position);
                let keep_sq = config.keep_radius * config.keep_radius;
                if !claims.is_claimed(id) && delta.length_squared() <= keep_sq {
                    claims.claim(id);
                    return Some(delta);
                }
                fish.target = None;
            }
            None => fish.target = None,
        }
    }

    if fish.cooldown > 0.0 {
        return None;
    }

    let (id, delta) = nearest_unclaimed(fish.position, particles, claims, bounds, config.seek_radius)?;
    fish.target = Some(id);
    claims.claim(id);
    Some(delta)
}

/// Closest unclaimed particle strictly inside `radius`, measured across the torus.
#[must_use]
pub fn nearest_unclaimed(
    from: Vec2,
    particles: &ParticlePool,
    claims: &ClaimSet,
    bounds: Bounds,
    radius: f32,
) -> Option<(ParticleId, Vec2)> {
    let radius_sq = radius * radius;
    particles
        .iter()
        .filter(|(id, _)| !claims.is_claimed(*id))
        .map(|(id, particle)| (id, bounds.delta(from, particle.position)))
        .filter(|(_, delta)| delta.length_squared() < radius_sq)
        .min_by_key(|(_, delta)| OrderedFloat(delta.length_squared()))
}
