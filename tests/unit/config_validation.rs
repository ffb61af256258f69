//! Unit tests for configuration validation.

use stepper_planner::config::{validate_config, MachineConfig};
use stepper_planner::error::{ConfigError, Error};
use stepper_planner::Axis;

fn machine(toml_str: &str) -> MachineConfig {
    toml::from_str(toml_str).expect("Failed to parse TOML")
}

const VALID: &str = r#"
[planner]
max_jerk_mm_per_sec = 20.0

[timer]
frequency_hz = 2000000
min_step_rate = 120

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

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    assert!(validate_config(&machine(VALID)).is_ok());
}

/// Test validation fails for zero steps per millimeter.
#[test]
fn test_zero_steps_per_mm() {
    let config = machine(&VALID.replace("steps_per_mm = 400.0", "steps_per_mm = 0.0"));

    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidStepsPerMm { axis: Axis::Z, .. }))
    ));
}

/// Test validation fails for a negative maximum feed.
#[test]
fn test_negative_max_feedrate() {
    let config = machine(&VALID.replace(
        "max_feedrate_mm_per_sec = 45.0",
        "max_feedrate_mm_per_sec = -45.0",
    ));

    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidFeedrate { axis: Axis::E, .. }))
    ));
}

/// Test validation fails when the minimum feed exceeds the maximum.
#[test]
fn test_min_feedrate_above_max() {
    let config = machine(&VALID.replace(
        "max_feedrate_mm_per_sec = 5.0",
        "max_feedrate_mm_per_sec = 5.0\nmin_feedrate_mm_per_sec = 6.0",
    ));

    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidFeedrate { axis: Axis::Z, value })) if value == 6.0
    ));
}

/// Test validation fails for zero acceleration.
#[test]
fn test_zero_acceleration() {
    let config = machine(&VALID.replacen(
        "max_acceleration_mm_per_sec2 = 3000.0",
        "max_acceleration_mm_per_sec2 = 0.0",
        1,
    ));

    let result = validate_config(&config);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAcceleration { axis: Axis::X, .. }))
    ));
}

/// Test validation fails for a non-positive jerk limit.
#[test]
fn test_invalid_jerk() {
    let config = machine(&VALID.replace("max_jerk_mm_per_sec = 20.0", "max_jerk_mm_per_sec = 0.0"));

    let result = validate_config(&config);
    assert_eq!(result, Err(Error::Config(ConfigError::InvalidJerk(0.0))));
}

/// Test validation fails for a timer too slow for the top step rate.
#[test]
fn test_timer_frequency_too_low() {
    let config = machine(&VALID.replace("frequency_hz = 2000000", "frequency_hz = 100000"));

    let result = validate_config(&config);
    assert_eq!(
        result,
        Err(Error::Config(ConfigError::InvalidTimerFrequency(100_000)))
    );
}

/// Test validation fails for a zero minimum step rate.
#[test]
fn test_zero_min_step_rate() {
    let config = machine(&VALID.replace("min_step_rate = 120", "min_step_rate = 0"));

    let result = validate_config(&config);
    assert_eq!(result, Err(Error::Config(ConfigError::InvalidMinStepRate(0))));
}
