//! The shoal world: pools, the per-tick pipeline and pointer strikes.

use std::fmt;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::FrameClock;
use crate::config::ShoalConfig;
use crate::fish::Fish;
use crate::geometry::{Bounds, Vec2};
use crate::input::{PointerState, Viewport};
use crate::particle::ParticlePool;
use crate::render::{FishSprite, Palette, Surface};
use crate::resolver::{ClaimSet, resolve_target};
use crate::steering::{integrate, steer};
use crate::{ShoalError, Tick};

/// Counters produced by one processed tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickEvents {
    pub tick: Tick,
    /// Particles eaten (and respawned) this tick.
    pub eaten: usize,
    /// Fish that finished their death fade and respawned.
    pub revived: usize,
    /// Particles held as targets at the end of the tick.
    pub claimed: usize,
}

/// Emitted once per successful pointer strike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KillEvent {
    /// Index of the struck fish in the pool.
    pub fish: usize,
    /// Surface-local strike position.
    pub position: Vec2,
    pub at_ms: f64,
}

/// Aggregate simulation state.
pub struct Shoal {
    config: ShoalConfig,
    tick: Tick,
    rng: SmallRng,
    viewport: Viewport,
    pointer: PointerState,
    palette: Palette,
    particles: ParticlePool,
    fish: Vec<Fish>,
    claims: ClaimSet,
    clock: FrameClock,
}

impl fmt::Debug for Shoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shoal")
            .field("tick", &self.tick)
            .field("viewport", &self.viewport)
            .field("particles", &self.particles.len())
            .field("fish", &self.fish.len())
            .finish()
    }
}

impl Shoal {
    /// Builds a world for `viewport`, seeding both pools from its area.
    pub fn new(config: ShoalConfig, viewport: Viewport) -> Result<Self, ShoalError> {
        let mut shoal = Self::from_parts(config, viewport, ParticlePool::default(), Vec::new())?;
        shoal.reseed();
        Ok(shoal)
    }

    /// Builds a world around explicit pools, e.g. for scripted scenarios.
    pub fn from_parts(
        config: ShoalConfig,
        viewport: Viewport,
        particles: ParticlePool,
        fish: Vec<Fish>,
    ) -> Result<Self, ShoalError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let clock = FrameClock::new(config.frame_interval_ms(), config.max_dt, 0.0);
        Ok(Self {
            config,
            tick: Tick::zero(),
            rng,
            viewport,
            pointer: PointerState::default(),
            palette: Palette::default(),
            particles,
            fish,
            claims: ClaimSet::new(),
            clock,
        })
    }

    /// Discards every entity and seeds fresh pools sized for the viewport.
    pub fn reseed(&mut self) {
        let bounds = self.viewport.bounds;
        let sizes = self.config.pool_sizes(bounds);
        self.particles = ParticlePool::seeded(sizes.particles, &mut self.rng, bounds, &self.config);
        self.fish = (0..sizes.fish)
            .map(|_| Fish::random(&mut self.rng, bounds, &self.config))
            .collect();
        self.claims.begin_tick();
        debug!(
            width = bounds.width,
            height = bounds.height,
            particles = sizes.particles,
            fish = sizes.fish,
            "seeded shoal pools"
        );
    }

    /// Applies a new surface size and placement; always reseeds.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.reseed();
    }

    /// Moves the surface origin (scrolling) without touching entities.
    pub fn reposition(&mut self, left: f32, top: f32) {
        self.viewport.left = left;
        self.viewport.top = top;
    }

    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        self.pointer.moved(client_x, client_y);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left();
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Re-primes the frame clock, typically when the loop (re)starts.
    pub fn resume(&mut self, now_ms: f64) {
        self.clock.reset(now_ms);
    }

    /// Host frame callback: throttles, steps and redraws.
    ///
    /// Returns `None` when the frame was skipped by the throttle.
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn Surface) -> Option<TickEvents> {
        let dt = self.clock.advance(now_ms)?;
        let events = self.step(dt, now_ms);
        self.render(surface, now_ms);
        Some(events)
    }

    /// Execute one simulation tick of `dt` seconds at host time `now_ms`.
    pub fn step(&mut self, dt: f32, now_ms: f64) -> TickEvents {
        let bounds = self.viewport.bounds;
        let pointer = self.pointer.local(&self.viewport);
        let Self {
            config,
            rng,
            particles,
            fish,
            claims,
            ..
        } = self;

        particles.integrate(dt, bounds);
        claims.begin_tick();

        let mut eaten = 0;
        let mut revived = 0;
        for f in fish.iter_mut() {
            if !f.is_alive() {
                if f.revive_if_due(now_ms, rng, bounds, config) {
                    revived += 1;
                }
                continue;
            }

            f.cooldown = (f.cooldown - dt).max(0.0);
            let target_delta = resolve_target(f, particles, claims, bounds, config);
            let steering = steer(f, target_delta, pointer, dt, rng, config);
            integrate(f, &steering, dt, bounds, config);
            if consume_target(f, particles, rng, bounds, config) {
                eaten += 1;
            }
        }

        self.tick = self.tick.next();
        let events = TickEvents {
            tick: self.tick,
            eaten,
            revived,
            claimed: self.fish.iter().filter(|f| f.target.is_some()).count(),
        };
        trace!(tick = events.tick.0, eaten, revived, dt, "shoal tick");
        events
    }

    /// Strikes the nearest alive fish under a pointer press at client coordinates.
    ///
    /// Presses outside the surface or away from every fish do nothing.
    pub fn strike(&mut self, client_x: f32, client_y: f32, now_ms: f64) -> Option<KillEvent> {
        let local = self.viewport.to_local(client_x, client_y);
        if !self.viewport.contains_local(local) {
            return None;
        }

        let config = &self.config;
        let (index, _) = self
            .fish
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_alive())
            .filter_map(|(index, f)| {
                let dist_sq = (f.position - local).length_squared();
                let radius = f.hit_radius(config);
                (dist_sq <= radius * radius).then_some((index, dist_sq))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        self.fish[index].strike(now_ms, &mut self.rng, &self.config);
        debug!(fish = index, x = local.x, y = local.y, "fish struck");
        Some(KillEvent {
            fish: index,
            position: local,
            at_ms: now_ms,
        })
    }

    /// Clears `surface` and draws every particle and fish.
    pub fn render(&self, surface: &mut dyn Surface, now_ms: f64) {
        surface.clear(self.viewport.bounds);
        for (_, particle) in self.particles.iter() {
            let color = self.palette.accent(particle.color_mix).with_alpha(particle.alpha);
            surface.fill_dot(particle.position, particle.size, color);
        }
        for f in &self.fish {
            let sprite = FishSprite::layout(f, &self.palette, now_ms, self.config.death_fade_ms);
            surface.draw_fish(&sprite);
        }
    }

    /// Serializable summary of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ShoalSnapshot {
        ShoalSnapshot {
            tick: self.tick.0,
            width: self.viewport.bounds.width,
            height: self.viewport.bounds.height,
            particles: self.particles.len(),
            alive: self.fish.iter().filter(|f| f.is_alive()).count(),
            claimed: self.fish.iter().filter(|f| f.target.is_some()).count(),
            fish: self.fish.iter().map(FishSnapshot::from).collect(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ShoalConfig {
        &self.config
    }

    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.viewport.bounds
    }

    #[must_use]
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn particles(&self) -> &ParticlePool {
        &self.particles
    }

    #[must_use]
    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    /// Mutable access to the fish pool (its length is fixed).
    #[must_use]
    pub fn fish_mut(&mut self) -> &mut [Fish] {
        &mut self.fish
    }
}

/// Eats the held target if the fish has reached it.
fn consume_target<R: Rng + ?Sized>(
    fish: &mut Fish,
    particles: &mut ParticlePool,
    rng: &mut R,
    bounds: Bounds,
    config: &ShoalConfig,
) -> bool {
    let Some(id) = fish.target else {
        return false;
    };
    let Some(particle) = particles.get(id) else {
        fish.target = None;
        return false;
    };
    let eat_sq = config.eat_radius * config.eat_radius;
    if bounds.delta(fish.position, particle.position).length_squared() >= eat_sq {
        return false;
    }

    particles.respawn(id, rng, bounds, config);
    fish.target = None;
    fish.cooldown = config.eat_cooldown.sample(rng);
    let kick = config.eat_wander_kick;
    if kick > 0.0 {
        fish.wander += rng.random_range(-kick..kick);
    }
    true
}

/// Per-fish entry of a [`ShoalSnapshot`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FishSnapshot {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub size: f32,
    pub max_speed: f32,
    pub alive: bool,
    pub has_target: bool,
}

impl From<&Fish> for FishSnapshot {
    fn from(fish: &Fish) -> Self {
        Self {
            position: [fish.position.x, fish.position.y],
            velocity: [fish.velocity.x, fish.velocity.y],
            size: fish.size,
            max_speed: fish.max_speed,
            alive: fish.is_alive(),
            has_target: fish.target.is_some(),
        }
    }
}

/// Serializable world summary for hosts and logs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoalSnapshot {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub particles: usize,
    pub alive: usize,
    pub claimed: usize,
    pub fish: Vec<FishSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::render::{CommandBuffer, DrawCommand};

    fn seeded(seed: u64, width: f32, height: f32) -> Shoal {
        let config = ShoalConfig {
            rng_seed: Some(seed),
            ..ShoalConfig::default()
        };
        Shoal::new(config, Viewport::new(0.0, 0.0, width, height)).expect("shoal")
    }

    #[test]
    fn new_world_sizes_pools_from_area() {
        let shoal = seeded(1, 800.0, 600.0);
        assert_eq!(shoal.particles().len(), 110);
        assert_eq!(shoal.fish().len(), 8);
        assert_eq!(shoal.tick(), Tick(0));
    }

    #[test]
    fn resize_reseeds_everything() {
        let mut shoal = seeded(2, 800.0, 600.0);
        let before = shoal.snapshot();
        shoal.resize(Viewport::new(0.0, 0.0, 3840.0, 2160.0));
        assert_eq!(shoal.particles().len(), 170);
        assert_eq!(shoal.fish().len(), 12);
        assert_ne!(before.fish[0].position, shoal.snapshot().fish[0].position);
    }

    #[test]
    fn reposition_keeps_entities() {
        let mut shoal = seeded(3, 800.0, 600.0);
        let before = shoal.snapshot();
        shoal.reposition(0.0, -350.0);
        assert_eq!(before, shoal.snapshot());
        assert_eq!(shoal.viewport().top, -350.0);
    }

    #[test]
    fn frame_throttles_and_renders() {
        let mut shoal = seeded(4, 800.0, 600.0);
        shoal.resume(1_000.0);
        let mut surface = CommandBuffer::new();

        assert!(shoal.frame(1_010.0, &mut surface).is_none());
        assert!(surface.commands().is_empty());

        let events = shoal.frame(1_030.0, &mut surface).expect("processed");
        assert_eq!(events.tick, Tick(1));
        let commands = surface.commands();
        assert!(matches!(commands.first(), Some(DrawCommand::Clear(_))));
        let dots = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Dot { .. }))
            .count();
        assert_eq!(dots, 110);
        assert_eq!(surface.sprites().count(), 8);
    }

    #[test]
    fn frame_pacing_follows_configured_rate() {
        let config = ShoalConfig {
            rng_seed: Some(4),
            target_fps: 20.0,
            ..ShoalConfig::default()
        };
        let mut shoal = Shoal::new(config, Viewport::new(0.0, 0.0, 800.0, 600.0)).expect("shoal");
        let mut surface = CommandBuffer::new();
        shoal.resume(0.0);

        assert!(shoal.frame(30.0, &mut surface).is_none());
        assert!(shoal.frame(49.0, &mut surface).is_none());
        assert!(shoal.frame(50.0, &mut surface).is_some());
    }

    #[test]
    fn strike_ignores_presses_outside_the_surface() {
        let mut shoal = seeded(5, 800.0, 600.0);
        shoal.reposition(100.0, 100.0);
        shoal.fish_mut()[0].position = Vec2::new(2.0, 2.0);
        assert!(shoal.strike(99.0, 99.0, 0.0).is_none());
        let kill = shoal.strike(102.0, 102.0, 0.0).expect("hit");
        assert_eq!(kill.position, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn eating_respawns_particle_and_releases_target() {
        let config = ShoalConfig {
            rng_seed: Some(6),
            wander_weight: 0.0,
            ..ShoalConfig::default()
        };
        let bounds = Bounds::new(800.0, 600.0);
        let particle = Particle {
            position: Vec2::new(105.0, 100.0),
            velocity: Vec2::ZERO,
            size: 1.5,
            alpha: 0.3,
            color_mix: 0.25,
        };
        let mut fish = Fish::random(&mut config.seeded_rng(), bounds, &config);
        fish.position = Vec2::new(100.0, 100.0);
        fish.cooldown = 0.0;
        let mut shoal = Shoal::from_parts(
            config,
            Viewport::new(0.0, 0.0, 800.0, 600.0),
            ParticlePool::from_particles([particle]),
            vec![fish],
        )
        .expect("shoal");

        let events = shoal.step(0.025, 0.0);
        assert_eq!(events.eaten, 1);
        assert!(shoal.fish()[0].target.is_none());
        assert!(shoal.config().eat_cooldown.contains(shoal.fish()[0].cooldown));
        assert_eq!(shoal.particles().len(), 1);
        let (_, fresh) = shoal.particles().iter().next().expect("particle");
        assert_ne!(*fresh, particle);
    }
}
