//! Headless driver for the shoal engine: scripted pointer input on a fixed
//! host frame cadence, used for soak runs and seed reproduction.

use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Serialize;
use shoal_core::{CommandBuffer, Shoal, ShoalConfig, ShoalSnapshot, Viewport};
use tracing::{debug, info};

/// Parameters of one headless run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub width: f32,
    pub height: f32,
    /// Host callbacks to simulate; the engine throttles them itself.
    pub frames: u32,
    /// Spacing of host callbacks in milliseconds.
    pub host_interval_ms: f64,
    /// Strike the first alive fish every this many host frames (0 disables).
    pub strike_every: u32,
    /// Sweep the pointer around the surface centre.
    pub pointer: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            frames: 2_400,
            host_interval_ms: 1000.0 / 60.0,
            strike_every: 120,
            pointer: true,
        }
    }
}

/// Totals gathered over a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub frames: u32,
    pub ticks: u64,
    pub eaten: usize,
    pub revived: usize,
    pub kills: usize,
    pub draw_commands: usize,
    pub snapshot: ShoalSnapshot,
}

/// Reads a JSON config file; missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<ShoalConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ShoalConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Drives a fresh world through `options.frames` host callbacks.
pub fn run(config: ShoalConfig, options: &RunOptions) -> Result<RunReport> {
    ensure!(
        options.host_interval_ms > 0.0,
        "host interval must be positive"
    );
    let viewport = Viewport::new(0.0, 0.0, options.width, options.height);
    let mut shoal = Shoal::new(config, viewport).context("failed to build shoal")?;
    let mut surface = CommandBuffer::new();

    let mut report = RunReport {
        frames: options.frames,
        ticks: 0,
        eaten: 0,
        revived: 0,
        kills: 0,
        draw_commands: 0,
        snapshot: shoal.snapshot(),
    };

    shoal.resume(0.0);
    for frame in 1..=options.frames {
        let now = f64::from(frame) * options.host_interval_ms;

        if options.pointer {
            let bounds = shoal.bounds();
            let phase = frame as f32 * 0.01;
            let radius = bounds.width.min(bounds.height) * 0.3;
            shoal.pointer_moved(
                bounds.width * 0.5 + radius * (phase * TAU).cos(),
                bounds.height * 0.5 + radius * (phase * TAU).sin(),
            );
        }

        if options.strike_every > 0 && frame % options.strike_every == 0 {
            let victim = shoal.fish().iter().find(|f| f.is_alive()).map(|f| f.position);
            if let Some(at) = victim {
                if let Some(kill) = shoal.strike(at.x, at.y, now) {
                    debug!(fish = kill.fish, at_ms = kill.at_ms, "scripted strike");
                    report.kills += 1;
                }
            }
        }

        if let Some(events) = shoal.frame(now, &mut surface) {
            report.ticks = events.tick.0;
            report.eaten += events.eaten;
            report.revived += events.revived;
            report.draw_commands += surface.drain().count();
        }
    }

    report.snapshot = shoal.snapshot();
    info!(
        ticks = report.ticks,
        eaten = report.eaten,
        revived = report.revived,
        kills = report.kills,
        alive = report.snapshot.alive,
        "headless run finished"
    );
    Ok(report)
}
