//! Linear move requests.

use crate::config::units::{Millimeters, MmPerSec};

use super::axis::{Axis, NUM_AXES};

/// How request coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Positioning {
    /// Coordinates are machine positions.
    #[default]
    Absolute,
    /// Coordinates are offsets from the end of the last queued move.
    Relative,
}

/// A linear move toward a target, as submitted by the command layer.
///
/// Axes left unset keep their position.
///
/// # Example
///
/// ```rust
/// use stepper_planner::{MoveRequest, MmPerSec};
///
/// let request = MoveRequest::absolute()
///     .x(120.0)
///     .y(40.0)
///     .feedrate(MmPerSec::from_mm_per_min(3000.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveRequest {
    /// Target or offset per axis, in millimeters.
    pub targets: [Option<f32>; NUM_AXES],

    /// Coordinate interpretation.
    pub positioning: Positioning,

    /// Requested feed along the path. `None` uses the axes' average feed.
    pub feedrate: Option<MmPerSec>,
}

impl MoveRequest {
    /// Empty request in absolute coordinates.
    pub const fn absolute() -> Self {
        Self {
            targets: [None; NUM_AXES],
            positioning: Positioning::Absolute,
            feedrate: None,
        }
    }

    /// Empty request in relative coordinates.
    pub const fn relative() -> Self {
        Self {
            targets: [None; NUM_AXES],
            positioning: Positioning::Relative,
            feedrate: None,
        }
    }

    /// Set the target (or offset) of one axis.
    pub fn axis(mut self, axis: Axis, value: Millimeters) -> Self {
        self.targets[axis.index()] = Some(value.0);
        self
    }

    /// Set the X target.
    pub fn x(self, mm: f32) -> Self {
        self.axis(Axis::X, Millimeters(mm))
    }

    /// Set the Y target.
    pub fn y(self, mm: f32) -> Self {
        self.axis(Axis::Y, Millimeters(mm))
    }

    /// Set the Z target.
    pub fn z(self, mm: f32) -> Self {
        self.axis(Axis::Z, Millimeters(mm))
    }

    /// Set the extruder target.
    pub fn e(self, mm: f32) -> Self {
        self.axis(Axis::E, Millimeters(mm))
    }

    /// Set the feed rate.
    pub fn feedrate(mut self, feedrate: MmPerSec) -> Self {
        self.feedrate = Some(feedrate);
        self
    }

    /// Target (or offset) of one axis.
    #[inline]
    pub fn target(&self, axis: Axis) -> Option<f32> {
        self.targets[axis.index()]
    }
}

/// A request pinned to absolute targets, kept with its Block.
///
/// Only the axes the request named carry a target, so re-submitting it after
/// an endstop abort drives those axes to the same physical point and leaves
/// the others where the abort left them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedMove {
    /// Absolute target per named axis, in millimeters.
    pub target: [Option<f32>; NUM_AXES],

    /// Feed the request asked for, before machine limits were applied.
    pub feedrate: Option<MmPerSec>,
}

impl From<ResolvedMove> for MoveRequest {
    fn from(resolved: ResolvedMove) -> Self {
        Self {
            targets: resolved.target,
            positioning: Positioning::Absolute,
            feedrate: resolved.feedrate,
        }
    }
}
