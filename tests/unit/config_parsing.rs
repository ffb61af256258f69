//! Unit tests for TOML configuration parsing.

use stepper_planner::config::{parse_config, MachineConfig};
use stepper_planner::error::{ConfigError, Error};
use stepper_planner::Axis;

const AXES: &str = r#"
[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 95.0
max_feedrate_mm_per_sec = 45.0
max_acceleration_mm_per_sec2 = 3000.0
"#;

/// Test parsing a minimal machine: every optional field falls back.
#[test]
fn test_parse_minimal_machine() {
    let config: MachineConfig = toml::from_str(AXES).expect("Failed to parse TOML");

    let x = config.axis(Axis::X);
    assert_eq!(x.steps_per_mm, 80.0);
    assert_eq!(x.max_feedrate.0, 500.0);
    assert_eq!(x.max_acceleration.0, 3000.0);
    assert_eq!(x.min_feedrate.0, 0.0);
    assert_eq!(x.avg_feedrate.0, 25.0);
    assert!(!x.invert_direction);
    assert!(!x.enable_active_high);
    assert!(!x.endstops.min && !x.endstops.max);
    assert!(x.endstops.pullup);

    assert_eq!(config.planner.max_jerk.0, 20.0);
    assert_eq!(config.timer.frequency_hz, 2_000_000);
    assert_eq!(config.timer.min_step_rate, 120);
}

/// Test parsing endstop wiring and polarity.
#[test]
fn test_parse_endstops() {
    let toml_str = AXES.replace(
        "max_acceleration_mm_per_sec2 = 100.0\n",
        r#"max_acceleration_mm_per_sec2 = 100.0

[axes.z.endstops]
min = true
inverting = true
pullup = false
"#,
    );

    let config: MachineConfig = toml::from_str(&toml_str).expect("Failed to parse TOML");
    let endstops = config.axis(Axis::Z).endstops;

    assert!(endstops.min);
    assert!(!endstops.max);
    assert!(endstops.inverting);
    assert!(!endstops.pullup);
}

/// Test parsing planner and timer sections.
#[test]
fn test_parse_planner_and_timer() {
    let toml_str = format!(
        r#"
[planner]
max_jerk_mm_per_sec = 8.5

[timer]
frequency_hz = 16000000
min_step_rate = 32
{AXES}"#
    );

    let config = parse_config(&toml_str).expect("Config should be valid");
    assert_eq!(config.planner.max_jerk.0, 8.5);
    assert_eq!(config.planner.safe_speed(), 4.25);
    assert_eq!(config.timer.frequency_hz, 16_000_000);
    assert_eq!(config.timer.min_step_rate, 32);
}

/// Test parsing direction and enable polarity with explicit feeds.
#[test]
fn test_parse_axis_polarity_and_feeds() {
    let toml_str = AXES.replace(
        "[axes.e]\n",
        "[axes.e]\ninvert_direction = true\nenable_active_high = true\nmin_feedrate_mm_per_sec = 1.0\navg_feedrate_mm_per_sec = 10.0\n",
    );

    let config = parse_config(&toml_str).expect("Config should be valid");
    let e = config.axis(Axis::E);
    assert!(e.invert_direction);
    assert!(e.enable_active_high);
    assert_eq!(e.min_feedrate.0, 1.0);
    assert_eq!(e.avg_feedrate.0, 10.0);
}

/// Test that a missing axis is a parse error.
#[test]
fn test_missing_axis_is_parse_error() {
    let toml_str = AXES.split("[axes.e]").next().unwrap_or_default();

    let result = parse_config(toml_str);
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that a missing required field is a parse error.
#[test]
fn test_missing_steps_per_mm_is_parse_error() {
    let toml_str = AXES.replacen("steps_per_mm = 80.0\n", "", 1);

    let result = parse_config(&toml_str);
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}
