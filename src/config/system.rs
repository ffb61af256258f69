//! Machine configuration - root configuration structure.

use serde::Deserialize;

use crate::motion::Axis;

use super::axis::{AxesConfig, AxisConfig};
use super::planner::{PlannerConfig, TimerConfig};

/// Root configuration structure from TOML.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MachineConfig {
    /// Per-axis calibration and wiring.
    pub axes: AxesConfig,

    /// Look-ahead settings.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Step timer settings.
    #[serde(default)]
    pub timer: TimerConfig,
}

impl MachineConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        self.axes.get(axis)
    }
}
