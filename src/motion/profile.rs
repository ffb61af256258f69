//! Trapezoidal rate profile calculation.
//!
//! A Block accelerates from its entry rate toward the nominal rate, cruises,
//! then decelerates to its exit rate. Phase boundaries are expressed as step
//! event indices so the step interrupt only compares counters.

use libm::{ceilf, floorf};

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating from the entry rate toward the nominal rate.
    Accelerating,
    /// Moving at the nominal rate.
    Cruising,
    /// Decelerating toward the exit rate.
    Decelerating,
    /// Motion complete.
    Complete,
}

/// Computed trapezoid for a Block.
///
/// Invariant: `accelerate_until <= decelerate_after <= step_event_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trapezoid {
    /// Step rate at the first event (steps/s).
    pub initial_rate: u32,

    /// Step rate reached at the last event (steps/s).
    pub final_rate: u32,

    /// Events spent accelerating.
    pub accelerate_until: u32,

    /// Event index where deceleration begins.
    pub decelerate_after: u32,
}

impl Trapezoid {
    /// Compute the trapezoid for a move of `step_event_count` events.
    ///
    /// # Arguments
    ///
    /// * `nominal_rate` - Cruise rate in steps/s
    /// * `acceleration_st` - Acceleration in steps/s²
    /// * `entry_factor` - Entry speed as a fraction of nominal speed
    /// * `exit_factor` - Exit speed as a fraction of nominal speed
    /// * `min_rate` - Floor for both end rates
    pub fn compute(
        step_event_count: u32,
        nominal_rate: u32,
        acceleration_st: f32,
        entry_factor: f32,
        exit_factor: f32,
        min_rate: u32,
    ) -> Self {
        let floor = min_rate.min(nominal_rate);
        let scaled = |factor: f32| -> u32 {
            let rate = ceilf(nominal_rate as f32 * factor);
            // NaN and negatives saturate to 0 and are clamped up
            (rate as u32).clamp(floor, nominal_rate)
        };
        let initial_rate = scaled(entry_factor);
        let final_rate = scaled(exit_factor);

        if step_event_count == 0 || !(acceleration_st > 0.0) {
            return Self {
                initial_rate,
                final_rate,
                accelerate_until: 0,
                decelerate_after: step_event_count,
            };
        }

        let count = step_event_count as i64;
        let nominal = nominal_rate as f32;
        let mut accel = ceilf(estimate_distance(initial_rate as f32, nominal, acceleration_st)) as i64;
        let decel = floorf(estimate_distance(nominal, final_rate as f32, -acceleration_st)) as i64;
        let mut plateau = count.saturating_sub(accel).saturating_sub(decel);

        // Nominal rate is never reached: accelerate until the curves meet
        if plateau < 0 {
            let meet = ceilf(intersection_distance(
                initial_rate as f32,
                final_rate as f32,
                acceleration_st,
                step_event_count as f32,
            )) as i64;
            accel = meet.clamp(0, count);
            plateau = 0;
        }

        Self {
            initial_rate,
            final_rate,
            accelerate_until: accel as u32,
            decelerate_after: (accel + plateau) as u32,
        }
    }

    /// Get the phase at a given step event index.
    pub fn phase_at(&self, event: u32, step_event_count: u32) -> MotionPhase {
        if event >= step_event_count {
            MotionPhase::Complete
        } else if event < self.accelerate_until {
            MotionPhase::Accelerating
        } else if event < self.decelerate_after {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Events spent at the nominal rate.
    #[inline]
    pub fn plateau(&self) -> u32 {
        self.decelerate_after - self.accelerate_until
    }
}

/// Distance (in steps) to change rate from `initial` to `target` at `accel`.
#[inline]
pub fn estimate_distance(initial: f32, target: f32, accel: f32) -> f32 {
    (target * target - initial * initial) / (2.0 * accel)
}

/// Step index where accelerating from `initial` meets decelerating to
/// `final_rate` within `distance` steps.
#[inline]
pub fn intersection_distance(initial: f32, final_rate: f32, accel: f32, distance: f32) -> f32 {
    (2.0 * accel * distance - initial * initial + final_rate * final_rate) / (4.0 * accel)
}
