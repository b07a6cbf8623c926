//! Host-fed scalar state: canvas placement, pointer position and run gates.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Vec2};

/// Placement of the drawing surface in client (window) coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub bounds: Bounds,
}

impl Viewport {
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            bounds: Bounds::new(width, height),
        }
    }

    /// Converts a client-space point into surface-local coordinates.
    #[must_use]
    pub fn to_local(&self, client_x: f32, client_y: f32) -> Vec2 {
        Vec2::new(client_x - self.left, client_y - self.top)
    }

    /// Inclusive containment test used for pointer presses.
    #[must_use]
    pub fn contains_local(&self, local: Vec2) -> bool {
        local.x >= 0.0
            && local.y >= 0.0
            && local.x <= self.bounds.width
            && local.y <= self.bounds.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// Last known pointer location in client coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

impl PointerState {
    pub fn moved(&mut self, client_x: f32, client_y: f32) {
        *self = Self {
            x: client_x,
            y: client_y,
            active: true,
        };
    }

    pub fn left(&mut self) {
        self.active = false;
    }

    /// Surface-local pointer position, or `None` when inactive.
    #[must_use]
    pub fn local(&self, viewport: &Viewport) -> Option<Vec2> {
        self.active.then(|| viewport.to_local(self.x, self.y))
    }
}

/// Conditions that must all hold for the loop to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gate {
    /// Fine pointer with hover support.
    pub capable: bool,
    /// User prefers reduced motion.
    pub reduced_motion: bool,
    /// Surface intersects the visible viewport.
    pub in_view: bool,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            capable: false,
            reduced_motion: false,
            in_view: true,
        }
    }
}

impl Gate {
    #[must_use]
    pub const fn should_run(&self) -> bool {
        self.capable && !self.reduced_motion && self.in_view
    }
}
