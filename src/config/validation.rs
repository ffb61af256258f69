//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::motion::{Axis, MAX_STEP_RATE};

use super::{AxisConfig, MachineConfig, PlannerConfig, TimerConfig};

/// Smallest timer period, in ticks, allowed at the top step rate.
const MIN_PERIOD_AT_MAX_RATE: u32 = 4;

/// Validate a machine configuration.
///
/// Checks:
/// - Every axis has positive, finite calibration, feed and acceleration values
/// - The junction jerk limit is positive
/// - The step timer can resolve the fastest supported step rate
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    for (axis, axis_config) in config.axes.iter() {
        validate_axis(axis, axis_config)?;
    }

    validate_planner(&config.planner)?;
    validate_timer(&config.timer)?;

    Ok(())
}

/// Validate a single axis configuration.
pub fn validate_axis(axis: Axis, config: &AxisConfig) -> Result<()> {
    let spm = config.steps_per_mm;
    if !spm.is_finite() || spm <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidStepsPerMm { axis, value: spm }));
    }

    let max = config.max_feedrate.0;
    if !max.is_finite() || max <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidFeedrate { axis, value: max }));
    }

    let avg = config.avg_feedrate.0;
    if !avg.is_finite() || avg <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidFeedrate { axis, value: avg }));
    }

    // Minimum may be zero but never above the maximum
    let min = config.min_feedrate.0;
    if !min.is_finite() || min < 0.0 || min > max {
        return Err(Error::Config(ConfigError::InvalidFeedrate { axis, value: min }));
    }

    let accel = config.max_acceleration.0;
    if !accel.is_finite() || accel <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration {
            axis,
            value: accel,
        }));
    }

    Ok(())
}

/// Validate look-ahead settings.
pub fn validate_planner(config: &PlannerConfig) -> Result<()> {
    let jerk = config.max_jerk.0;
    if !jerk.is_finite() || jerk <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidJerk(jerk)));
    }
    Ok(())
}

/// Validate step timer settings.
pub fn validate_timer(config: &TimerConfig) -> Result<()> {
    if config.frequency_hz < MAX_STEP_RATE * MIN_PERIOD_AT_MAX_RATE {
        return Err(Error::Config(ConfigError::InvalidTimerFrequency(
            config.frequency_hz,
        )));
    }

    if config.min_step_rate == 0 || config.min_step_rate > MAX_STEP_RATE {
        return Err(Error::Config(ConfigError::InvalidMinStepRate(
            config.min_step_rate,
        )));
    }

    Ok(())
}
