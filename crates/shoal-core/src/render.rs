//! Colour handling and the drawing seam between the engine and its host.
//!
//! The engine never touches a canvas. Each processed frame it clears a
//! [`Surface`], emits one dot per particle and one [`FishSprite`] per fish.
//! Sprite geometry is expressed in the fish's local frame (x forward) so the
//! host only has to translate and rotate.

use serde::{Deserialize, Serialize};

use crate::fish::{Fish, FishPhase};
use crate::geometry::{Bounds, Vec2, lerp};

/// Opaque colour with channels in `0..=255`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    /// Parses a whitespace separated channel triplet such as `"59 130 246"`.
    ///
    /// Falls back to `fallback` when fewer than three finite numbers are present.
    #[must_use]
    pub fn parse_triplet(raw: &str, fallback: Self) -> Self {
        let channels: Vec<f32> = raw
            .split_whitespace()
            .filter_map(|part| part.parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .collect();
        match channels.as_slice() {
            [r, g, b, ..] => Self([*r, *g, *b]),
            _ => fallback,
        }
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let [ar, ag, ab] = self.0;
        let [br, bg, bb] = other.0;
        Self([lerp(ar, br, t), lerp(ag, bg, t), lerp(ab, bb, t)])
    }

    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba { rgb: self, alpha }
    }
}

/// Colour plus opacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

impl Rgba {
    /// CSS `rgba()` notation with rounded channels.
    #[must_use]
    pub fn css(&self) -> String {
        let [r, g, b] = self.rgb.0;
        format!(
            "rgba({}, {}, {}, {})",
            r.round() as i32,
            g.round() as i32,
            b.round() as i32,
            self.alpha
        )
    }
}

/// Theme colours read from the host document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    pub primary: Rgb,
    pub primary_alt: Rgb,
    pub text_muted: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Rgb([59.0, 130.0, 246.0]),
            primary_alt: Rgb([96.0, 165.0, 250.0]),
            text_muted: Rgb([100.0, 116.0, 139.0]),
        }
    }
}

impl Palette {
    /// Builds a palette from raw CSS custom property values, falling back
    /// per colour.
    #[must_use]
    pub fn from_css_values(primary: &str, primary_alt: &str, text_muted: &str) -> Self {
        let fallback = Self::default();
        Self {
            primary: Rgb::parse_triplet(primary, fallback.primary),
            primary_alt: Rgb::parse_triplet(primary_alt, fallback.primary_alt),
            text_muted: Rgb::parse_triplet(text_muted, fallback.text_muted),
        }
    }

    /// Accent colour at `mix` between the two primaries.
    #[must_use]
    pub fn accent(&self, mix: f32) -> Rgb {
        self.primary.lerp(self.primary_alt, mix)
    }
}

/// Forked tail outline, relative to the body centre.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TailShape {
    pub base_x: f32,
    pub tip_x: f32,
    pub fork_x: f32,
    pub length: f32,
    pub width: f32,
    /// Wag factor applied to the tail's vertical extent.
    pub scale: f32,
}

/// Everything a host needs to draw one fish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FishSprite {
    pub center: Vec2,
    /// Heading in radians; the sprite's local +x axis.
    pub angle: f32,
    pub body_rx: f32,
    pub body_ry: f32,
    pub tail: TailShape,
    pub eye: Vec2,
    pub eye_radius: f32,
    /// Draw a crossed-out eye instead of a pupil.
    pub dead: bool,
    pub fill: Rgba,
    pub stroke: Rgba,
    /// Overall opacity multiplier (the death fade).
    pub opacity: f32,
}

const FISH_FILL_ALPHA: f32 = 0.2;
const FISH_STROKE_ALPHA: f32 = 0.38;

impl FishSprite {
    /// Lays out the sprite for `fish` at host time `now_ms`.
    #[must_use]
    pub fn layout(fish: &Fish, palette: &Palette, now_ms: f64, fade_ms: f64) -> Self {
        let (dead, opacity) = match fish.phase(now_ms, fade_ms) {
            FishPhase::Alive => (false, 1.0),
            FishPhase::Dying { fade } => (true, fade),
        };

        let body_rx = fish.size * 1.35;
        let body_ry = fish.size * 0.78;
        let base_x = -body_rx * 0.95;
        let length = fish.size * 0.95;
        let wag = (now_ms / 190.0 + f64::from(fish.color_mix) * 12.0).sin() as f32 * 0.22;

        Self {
            center: fish.position,
            angle: fish.velocity.angle(),
            body_rx,
            body_ry,
            tail: TailShape {
                base_x,
                tip_x: base_x - length,
                fork_x: base_x - length * 0.55,
                length,
                width: body_ry * 1.05,
                scale: 1.0 + wag,
            },
            eye: Vec2::new(body_rx * 0.5, -body_ry * 0.16),
            eye_radius: (fish.size * 0.1).max(1.4),
            dead,
            fill: palette.accent(fish.color_mix).with_alpha(FISH_FILL_ALPHA),
            stroke: palette.text_muted.with_alpha(FISH_STROKE_ALPHA),
            opacity,
        }
    }
}

/// Drawing target implemented by hosts.
pub trait Surface {
    /// Erases the whole surface.
    fn clear(&mut self, bounds: Bounds);

    /// Fills a circle.
    fn fill_dot(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Draws one fish.
    fn draw_fish(&mut self, sprite: &FishSprite);
}

/// Recorded drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Bounds),
    Dot { center: Vec2, radius: f32, color: Rgba },
    Fish(FishSprite),
}

/// Surface that records commands instead of drawing; used by headless hosts.
#[derive(Debug, Default, Clone)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, DrawCommand> {
        self.commands.drain(..)
    }

    /// Sprites recorded since the last drain.
    pub fn sprites(&self) -> impl Iterator<Item = &FishSprite> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Fish(sprite) => Some(sprite),
            _ => None,
        })
    }
}

impl Surface for CommandBuffer {
    fn clear(&mut self, bounds: Bounds) {
        self.commands.push(DrawCommand::Clear(bounds));
    }

    fn fill_dot(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Dot {
            center,
            radius,
            color,
        });
    }

    fn draw_fish(&mut self, sprite: &FishSprite) {
        self.commands.push(DrawCommand::Fish(*sprite));
    }
}
