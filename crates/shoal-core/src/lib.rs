//! Core engine for the ambient shoal: food particles drifting on a torus and
//! fish that hunt them, flee the pointer and can be struck down.
//!
//! The crate is host-agnostic. A host feeds it viewport, pointer and clock
//! readings, calls [`Shoal::frame`] from its per-frame callback, and draws
//! through the [`Surface`] trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod clock;
pub mod config;
pub mod fish;
pub mod geometry;
pub mod input;
pub mod particle;
pub mod render;
pub mod resolver;
pub mod steering;
pub mod world;

pub use clock::FrameClock;
pub use config::{PoolSizes, ShoalConfig, Span};
pub use fish::{Fish, FishPhase};
pub use geometry::{Bounds, Vec2, wrap_coordinate, wrapped_delta};
pub use input::{Gate, PointerState, Viewport};
pub use particle::{Particle, ParticleId, ParticlePool};
pub use render::{CommandBuffer, DrawCommand, FishSprite, Palette, Rgb, Rgba, Surface, TailShape};
pub use resolver::ClaimSet;
pub use steering::Steering;
pub use world::{FishSnapshot, KillEvent, Shoal, ShoalSnapshot, TickEvents};

/// Errors that can occur when constructing a shoal.
#[derive(Debug, Error)]
pub enum ShoalError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Processed-frame counter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}
