use std::env;
use std::io::Write;
use std::process::Command;

use shoal_app::{RunOptions, load_config, run};
use shoal_core::ShoalConfig;

fn seeded(seed: u64) -> ShoalConfig {
    ShoalConfig {
        rng_seed: Some(seed),
        ..ShoalConfig::default()
    }
}

#[test]
fn scripted_strikes_kill_and_fish_come_back() {
    let options = RunOptions {
        frames: 1_200,
        strike_every: 90,
        ..RunOptions::default()
    };
    let report = run(seeded(11), &options).expect("run");

    assert!(report.kills > 0);
    assert!(report.revived > 0);
    assert!(report.revived <= report.kills);
    // 1280x720 sits below both area thresholds.
    assert_eq!(report.snapshot.fish.len(), 8);
    assert_eq!(report.snapshot.particles, 110);
    assert!(report.draw_commands > 0);
}

#[test]
fn same_seed_reproduces_the_report() {
    let options = RunOptions {
        frames: 600,
        ..RunOptions::default()
    };
    let first = run(seeded(0xC0FFEE), &options).expect("first");
    let second = run(seeded(0xC0FFEE), &options).expect("second");
    assert_eq!(first, second);
}

#[test]
fn config_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, r#"{{ "fish_count_min": 3, "fish_count_max": 3, "rng_seed": 5 }}"#)
        .expect("write");
    let config = load_config(file.path()).expect("config");
    assert_eq!(config.fish_count_max, 3);
    assert_eq!(config.rng_seed, Some(5));

    let report = run(config, &RunOptions::default()).expect("run");
    assert_eq!(report.snapshot.fish.len(), 3);
}

#[test]
fn malformed_config_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "not json").expect("write");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn binary_runs_headless() {
    let bin = env!("CARGO_BIN_EXE_shoal");
    let output = Command::new(bin)
        .args(["--seed", "9", "--frames", "240", "--json"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run shoal binary");
    assert!(output.status.success(), "headless run failed");

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["frames"], 240);
    assert!(report["snapshot"]["particles"].as_u64().unwrap_or_default() >= 110);
}
