//! Planar vector math and toroidal helpers.

use serde::{Deserialize, Serialize};

/// Magnitudes at or below this are treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Two-component vector used for positions, velocities and steering.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Returns the unit vector, or zero when the magnitude is negligible.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len <= NORMALIZE_EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Heading angle in radians, 0 for a (near) zero vector.
    #[must_use]
    pub fn angle(self) -> f32 {
        if self.length() > 0.001 {
            self.y.atan2(self.x)
        } else {
            0.0
        }
    }

    /// Rescales the vector so its length does not exceed `max`.
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.001 {
            self * (max / len)
        } else {
            self
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

/// Wraps `value` into `[0, extent)`.
#[must_use]
pub fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let mut v = value % extent;
    if v < 0.0 {
        v += extent;
    }
    // `-tiny + extent` rounds up to `extent` in f32.
    if v >= extent { 0.0 } else { v }
}

/// Shortest signed displacement from `from` to `to` on a ring of length `extent`.
///
/// For coordinates already inside `[0, extent)` the magnitude never exceeds
/// `extent / 2`.
#[must_use]
pub fn wrapped_delta(from: f32, to: f32, extent: f32) -> f32 {
    let mut d = to - from;
    let half = extent * 0.5;
    if d > half {
        d -= extent;
    }
    if d < -half {
        d += extent;
    }
    d
}

/// Toroidal bounds of the simulation domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Builds bounds, flooring each side and keeping it at least one pixel.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: floor_extent(width),
            height: floor_extent(height),
        }
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[must_use]
    pub fn wrap(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            wrap_coordinate(point.x, self.width),
            wrap_coordinate(point.y, self.height),
        )
    }

    /// Shortest displacement from `from` to `to` across the torus.
    #[must_use]
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrapped_delta(from.x, to.x, self.width),
            wrapped_delta(from.y, to.y, self.height),
        )
    }

    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..self.width).contains(&point.x) && (0.0..self.height).contains(&point.y)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn floor_extent(value: f32) -> f32 {
    if value.is_finite() {
        value.floor().max(1.0)
    } else {
        1.0
    }
}

#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_delta_prefers_the_short_way_round() {
        assert_eq!(wrapped_delta(5.0, 395.0, 400.0), -10.0);
        assert_eq!(wrapped_delta(395.0, 5.0, 400.0), 10.0);
        assert_eq!(wrapped_delta(100.0, 150.0, 400.0), 50.0);
    }

    #[test]
    fn wrapped_delta_never_exceeds_half_extent() {
        let extent = 400.0;
        let mut from = 0.0_f32;
        while from < extent {
            let mut to = 0.0_f32;
            while to < extent {
                let d = wrapped_delta(from, to, extent);
                assert!(d.abs() <= extent / 2.0, "{from} -> {to} gave {d}");
                to += 7.3;
            }
            from += 11.1;
        }
    }

    #[test]
    fn wrap_coordinate_stays_half_open() {
        assert_eq!(wrap_coordinate(-10.0, 400.0), 390.0);
        assert_eq!(wrap_coordinate(410.0, 400.0), 10.0);
        assert_eq!(wrap_coordinate(400.0, 400.0), 0.0);
        assert_eq!(wrap_coordinate(-1e-9, 400.0), 0.0);
        assert_eq!(wrap_coordinate(f32::NAN, 400.0), 0.0);
    }

    #[test]
    fn normalize_guards_tiny_vectors() {
        assert_eq!(Vec2::new(1e-8, 0.0).normalize_or_zero(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).normalize_or_zero();
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bounds_floor_and_clamp_dimensions() {
        let bounds = Bounds::new(800.7, 0.2);
        assert_eq!(bounds.width, 800.0);
        assert_eq!(bounds.height, 1.0);
    }
}
