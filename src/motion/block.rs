//! Queued linear segments.

use super::axis::{Axis, Direction, LimitSide, NUM_AXES};
use super::profile::Trapezoid;
use super::request::ResolvedMove;

/// Limit switch guarding an axis's direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitProbe {
    /// End of travel the switch sits at.
    pub side: LimitSide,
    /// Input level that means "triggered".
    pub active_high: bool,
}

/// Electrical levels for one axis, fixed when the Block is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSignals {
    /// Direction pin level.
    pub direction_high: bool,
    /// Enable pin level that energizes the driver.
    pub enable_high: bool,
    /// Switch to sample before each step, if any.
    pub limit: Option<LimitProbe>,
}

/// A queued linear move, planned and executed as one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    /// Steps per axis (unsigned).
    pub steps: [u32; NUM_AXES],
    /// Travel direction per axis.
    pub directions: [Direction; NUM_AXES],
    /// Largest per-axis step count; one step event per tick.
    pub step_event_count: u32,

    /// Path length in millimeters.
    pub millimeters: f32,
    /// Cruise speed along the path (mm/s).
    pub nominal_speed: f32,
    /// Signed per-axis cruise velocity (mm/s).
    pub nominal_velocity: [f32; NUM_AXES],
    /// Cruise step rate (steps/s).
    pub nominal_rate: u32,

    /// Path acceleration (mm/s²).
    pub acceleration: f32,
    /// Acceleration in step events per second squared.
    pub acceleration_st: f32,
    /// Rate gained per timer tick, 8.24 fixed point.
    pub acceleration_rate: u32,

    /// Junction cap for `entry_speed` (mm/s).
    pub max_entry_speed: f32,
    /// Planned speed at the start of the Block (mm/s).
    pub entry_speed: f32,
    /// Planned speed at the end of the Block (mm/s).
    pub exit_speed: f32,
    /// Speed reachable from or to a standstill within the jerk limit (mm/s).
    pub safe_speed: f32,

    /// Step rate at the first event.
    pub initial_rate: u32,
    /// Step rate at the last event.
    pub final_rate: u32,
    /// Events spent accelerating.
    pub accelerate_until: u32,
    /// Event index where deceleration begins.
    pub decelerate_after: u32,

    /// Pin levels per axis.
    pub signals: [AxisSignals; NUM_AXES],

    /// Axis position when the Block starts (steps).
    pub start_position: [i32; NUM_AXES],
    /// Axis position when the Block completes (steps).
    pub end_position: [i32; NUM_AXES],

    /// Request this Block was built from.
    pub request: ResolvedMove,
}

impl Block {
    /// Placeholder for unused buffer slots.
    pub const EMPTY: Block = Block {
        steps: [0; NUM_AXES],
        directions: [Direction::Positive; NUM_AXES],
        step_event_count: 0,
        millimeters: 0.0,
        nominal_speed: 0.0,
        nominal_velocity: [0.0; NUM_AXES],
        nominal_rate: 0,
        acceleration: 0.0,
        acceleration_st: 0.0,
        acceleration_rate: 0,
        max_entry_speed: 0.0,
        entry_speed: 0.0,
        exit_speed: 0.0,
        safe_speed: 0.0,
        initial_rate: 0,
        final_rate: 0,
        accelerate_until: 0,
        decelerate_after: 0,
        signals: [AxisSignals {
            direction_high: false,
            enable_high: false,
            limit: None,
        }; NUM_AXES],
        start_position: [0; NUM_AXES],
        end_position: [0; NUM_AXES],
        request: ResolvedMove {
            target: [None; NUM_AXES],
            feedrate: None,
        },
    };

    /// Whether `axis` steps during this Block.
    #[inline]
    pub fn moves(&self, axis: Axis) -> bool {
        self.steps[axis.index()] != 0
    }

    /// Mask of the axes that step during this Block.
    pub fn moving_mask(&self) -> u8 {
        Axis::ALL
            .iter()
            .filter(|&&axis| self.moves(axis))
            .fold(0, |mask, axis| mask | axis.mask())
    }

    /// Current trapezoid parameters.
    pub fn trapezoid(&self) -> Trapezoid {
        Trapezoid {
            initial_rate: self.initial_rate,
            final_rate: self.final_rate,
            accelerate_until: self.accelerate_until,
            decelerate_after: self.decelerate_after,
        }
    }

    /// Recompute the trapezoid from the current entry and exit speeds.
    pub fn recalculate_trapezoid(&mut self, min_step_rate: u32) {
        let (entry, exit) = if self.nominal_speed > 0.0 {
            (
                self.entry_speed / self.nominal_speed,
                self.exit_speed / self.nominal_speed,
            )
        } else {
            (0.0, 0.0)
        };

        let t = Trapezoid::compute(
            self.step_event_count,
            self.nominal_rate,
            self.acceleration_st,
            entry,
            exit,
            min_step_rate,
        );
        self.initial_rate = t.initial_rate;
        self.final_rate = t.final_rate;
        self.accelerate_until = t.accelerate_until;
        self.decelerate_after = t.decelerate_after;
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::EMPTY
    }
}
