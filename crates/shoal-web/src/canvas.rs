//! `Surface` implementation over a 2D canvas context.

use std::f64::consts::TAU;

use shoal_core::{Bounds, FishSprite, Rgba, Surface, Vec2};
use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const TAIL_ALPHA: f64 = 0.7;
const BODY_SHEEN: &str = "rgba(255,255,255,0.06)";
const EYE_GLINT: &str = "rgba(255,255,255,0.35)";

pub(crate) struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub(crate) fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    fn dot(&self, center: Vec2, radius: f32, color: Rgba) -> Result<(), JsValue> {
        self.ctx.begin_path();
        self.ctx
            .arc(f64::from(center.x), f64::from(center.y), f64::from(radius), 0.0, TAU)?;
        self.ctx.set_fill_style_str(&color.css());
        self.ctx.fill();
        Ok(())
    }

    fn fish(&self, sprite: &FishSprite) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        let drawn = self.fish_in_local_frame(sprite);
        ctx.restore();
        drawn
    }

    fn fish_in_local_frame(&self, sprite: &FishSprite) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let fill = sprite.fill.css();
        let stroke = sprite.stroke.css();

        ctx.set_global_alpha(ctx.global_alpha() * f64::from(sprite.opacity));
        ctx.translate(f64::from(sprite.center.x), f64::from(sprite.center.y))?;
        ctx.rotate(f64::from(sprite.angle))?;
        ctx.set_line_width(1.0);

        // Tail, slightly more transparent than the body.
        let tail = sprite.tail;
        let base = f64::from(tail.base_x);
        let tip = f64::from(tail.tip_x);
        let fork = f64::from(tail.fork_x);
        let length = f64::from(tail.length);
        let spread = f64::from(tail.width * tail.scale);
        ctx.save();
        ctx.set_global_alpha(ctx.global_alpha() * TAIL_ALPHA);
        ctx.begin_path();
        ctx.move_to(base, 0.0);
        ctx.quadratic_curve_to(base - length * 0.35, spread * 0.85, tip, spread * 0.55);
        ctx.quadratic_curve_to(tip + length * 0.12, spread * 0.12, fork, 0.0);
        ctx.quadratic_curve_to(tip + length * 0.12, -spread * 0.12, tip, -spread * 0.55);
        ctx.quadratic_curve_to(base - length * 0.35, -spread * 0.85, base, 0.0);
        ctx.close_path();
        ctx.set_fill_style_str(&fill);
        ctx.set_stroke_style_str(&stroke);
        ctx.fill();
        ctx.stroke();
        ctx.restore();

        let rx = f64::from(sprite.body_rx);
        let ry = f64::from(sprite.body_ry);
        let gradient = ctx.create_linear_gradient(rx, 0.0, -rx, 0.0);
        gradient.add_color_stop(0.0, BODY_SHEEN)?;
        gradient.add_color_stop(0.22, &fill)?;
        gradient.add_color_stop(1.0, &fill)?;
        ctx.begin_path();
        ctx.ellipse(0.0, 0.0, rx, ry, 0.0, 0.0, TAU)?;
        ctx.set_fill_style_canvas_gradient(&gradient);
        ctx.set_stroke_style_str(&stroke);
        ctx.fill();
        ctx.stroke();

        let eye_x = f64::from(sprite.eye.x);
        let eye_y = f64::from(sprite.eye.y);
        let eye_r = f64::from(sprite.eye_radius);
        if sprite.dead {
            let arm = (eye_r * 2.1).max(3.2);
            ctx.save();
            ctx.set_stroke_style_str(&stroke);
            ctx.set_line_width((eye_r * 0.85).max(1.6));
            ctx.begin_path();
            ctx.move_to(eye_x - arm, eye_y - arm);
            ctx.line_to(eye_x + arm, eye_y + arm);
            ctx.move_to(eye_x - arm, eye_y + arm);
            ctx.line_to(eye_x + arm, eye_y - arm);
            ctx.stroke();
            ctx.restore();
        } else {
            ctx.begin_path();
            ctx.arc(eye_x, eye_y, eye_r, 0.0, TAU)?;
            ctx.set_fill_style_str(&stroke);
            ctx.fill();

            let glint = eye_r * 0.35;
            ctx.begin_path();
            ctx.arc(eye_x + glint, eye_y - glint, glint.max(0.7), 0.0, TAU)?;
            ctx.set_fill_style_str(EYE_GLINT);
            ctx.fill();
        }
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, bounds: Bounds) {
        self.ctx
            .clear_rect(0.0, 0.0, f64::from(bounds.width), f64::from(bounds.height));
    }

    fn fill_dot(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if let Err(err) = self.dot(center, radius, color) {
            warn!(?err, "failed to draw particle");
        }
    }

    fn draw_fish(&mut self, sprite: &FishSprite) {
        if let Err(err) = self.fish(sprite) {
            warn!(?err, "failed to draw fish");
        }
    }
}
