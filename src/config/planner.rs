//! Planner and step timer settings.

use serde::Deserialize;

use super::units::MmPerSec;

/// Look-ahead planner settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlannerConfig {
    /// Largest instantaneous velocity change allowed at a junction.
    #[serde(rename = "max_jerk_mm_per_sec")]
    pub max_jerk: MmPerSec,
}

impl PlannerConfig {
    /// Speed at which a full stop or reversal stays within the jerk limit.
    #[inline]
    pub fn safe_speed(&self) -> f32 {
        self.max_jerk.0 * 0.5
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_jerk: MmPerSec(20.0),
        }
    }
}

/// Step timer settings. Fixed once the motion core is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Timer counter frequency in Hz; periods are programmed in these ticks.
    #[serde(default = "default_frequency")]
    pub frequency_hz: u32,

    /// Floor for any step rate, keeping timer periods bounded.
    #[serde(default = "default_min_step_rate")]
    pub min_step_rate: u32,
}

fn default_frequency() -> u32 {
    2_000_000
}

fn default_min_step_rate() -> u32 {
    120
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency(),
            min_step_rate: default_min_step_rate(),
        }
    }
}
