use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use shoal_app::{RunOptions, load_config, run};
use shoal_core::ShoalConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "shoal",
    version,
    about = "Run the shoal simulation headless and report what happened"
)]
struct Cli {
    /// JSON file with configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed; omitted means entropy.
    #[arg(long, env = "SHOAL_SEED")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Number of host frame callbacks to simulate.
    #[arg(long, default_value_t = 2_400)]
    frames: u32,

    /// Host callback rate in Hz.
    #[arg(long, default_value_t = 60.0)]
    host_hz: f64,

    /// Strike a fish every N host frames (0 disables).
    #[arg(long, default_value_t = 120)]
    strike_every: u32,

    /// Leave the pointer outside the surface.
    #[arg(long)]
    no_pointer: bool,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ShoalConfig::default(),
    };
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }

    let options = RunOptions {
        width: cli.width,
        height: cli.height,
        frames: cli.frames,
        host_interval_ms: 1000.0 / cli.host_hz,
        strike_every: cli.strike_every,
        pointer: !cli.no_pointer,
    };
    info!(
        width = options.width,
        height = options.height,
        frames = options.frames,
        seed = ?config.rng_seed,
        "Starting headless shoal run"
    );

    let report = run(config, &options)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
