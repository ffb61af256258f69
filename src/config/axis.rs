//! Per-axis calibration and wiring configuration.

use serde::Deserialize;

use crate::motion::{Axis, Direction, LimitProbe, LimitSide, NUM_AXES};

use super::units::{MmPerSec, MmPerSecSquared};

/// Limit switch wiring for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EndstopConfig {
    /// A switch is fitted at the negative end of travel.
    #[serde(default)]
    pub min: bool,

    /// A switch is fitted at the positive end of travel.
    #[serde(default)]
    pub max: bool,

    /// Switch reads LOW when triggered (normally-open to ground).
    #[serde(default)]
    pub inverting: bool,

    /// Input wants the internal pull-up. Applied by board setup code.
    #[serde(default = "default_pullup")]
    pub pullup: bool,
}

fn default_pullup() -> bool {
    true
}

impl Default for EndstopConfig {
    fn default() -> Self {
        Self {
            min: false,
            max: false,
            inverting: false,
            pullup: true,
        }
    }
}

impl EndstopConfig {
    /// Switch that guards travel in `direction`, if one is fitted.
    pub fn probe_for(&self, direction: Direction) -> Option<LimitProbe> {
        let (fitted, side) = match direction {
            Direction::Positive => (self.max, LimitSide::Max),
            Direction::Negative => (self.min, LimitSide::Min),
        };
        fitted.then_some(LimitProbe {
            side,
            active_high: !self.inverting,
        })
    }
}

/// Calibration, limits and electrical polarity of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Motor steps per millimeter of travel.
    pub steps_per_mm: f32,

    /// Slowest feed a move on this axis is allowed to request.
    #[serde(default, rename = "min_feedrate_mm_per_sec")]
    pub min_feedrate: MmPerSec,

    /// Feed used when a request carries none.
    #[serde(default = "default_avg_feedrate", rename = "avg_feedrate_mm_per_sec")]
    pub avg_feedrate: MmPerSec,

    /// Fastest speed component this axis may move at.
    #[serde(rename = "max_feedrate_mm_per_sec")]
    pub max_feedrate: MmPerSec,

    /// Maximum acceleration along this axis.
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: MmPerSecSquared,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Driver enable input is active-high (most drivers are active-low).
    #[serde(default)]
    pub enable_active_high: bool,

    /// Limit switches.
    #[serde(default)]
    pub endstops: EndstopConfig,
}

fn default_avg_feedrate() -> MmPerSec {
    MmPerSec(25.0)
}

impl AxisConfig {
    /// Axis with the given calibration, no endstops and default polarity.
    pub const fn new(
        steps_per_mm: f32,
        max_feedrate: MmPerSec,
        max_acceleration: MmPerSecSquared,
    ) -> Self {
        Self {
            steps_per_mm,
            min_feedrate: MmPerSec(0.0),
            avg_feedrate: MmPerSec(25.0),
            max_feedrate,
            max_acceleration,
            invert_direction: false,
            enable_active_high: false,
            endstops: EndstopConfig {
                min: false,
                max: false,
                inverting: false,
                pullup: true,
            },
        }
    }

    /// Direction pin level for travel in `direction`.
    #[inline]
    pub fn direction_level(&self, direction: Direction) -> bool {
        match direction {
            Direction::Positive => !self.invert_direction,
            Direction::Negative => self.invert_direction,
        }
    }
}

/// Configuration for all machine axes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AxesConfig {
    /// X axis.
    pub x: AxisConfig,
    /// Y axis.
    pub y: AxisConfig,
    /// Z axis.
    pub z: AxisConfig,
    /// Extruder.
    pub e: AxisConfig,
}

impl AxesConfig {
    /// Configuration of one axis.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }

    /// Mutable configuration of one axis.
    pub fn get_mut(&mut self, axis: Axis) -> &mut AxisConfig {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::E => &mut self.e,
        }
    }

    /// Iterate axes in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }

    /// Steps per millimeter for every axis, in index order.
    pub fn steps_per_mm(&self) -> [f32; NUM_AXES] {
        Axis::ALL.map(|axis| self.get(axis).steps_per_mm)
    }
}

impl Default for AxesConfig {
    /// A typical belt-driven Cartesian printer with a leadscrew Z.
    fn default() -> Self {
        let mut x = AxisConfig::new(80.0, MmPerSec(500.0), MmPerSecSquared(3000.0));
        x.endstops.min = true;
        let mut y = x;
        y.steps_per_mm = 80.0;
        let mut z = AxisConfig::new(400.0, MmPerSec(5.0), MmPerSecSquared(100.0));
        z.avg_feedrate = MmPerSec(2.0);
        z.endstops.min = true;
        let mut e = AxisConfig::new(95.0, MmPerSec(45.0), MmPerSecSquared(3000.0));
        e.endstops = EndstopConfig::default();
        Self { x, y, z, e }
    }
}
