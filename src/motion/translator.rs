//! Move request to Block translation.
//!
//! Tracks the planned position (where the last queued Block ends) and turns
//! each request into a fully parameterized Block against it.

use libm::{ceilf, sqrtf};

use crate::config::units::{Millimeters, Steps};
use crate::config::MachineConfig;
use crate::error::{MotionError, Result};

use super::axis::{Axis, Direction, NUM_AXES};
use super::block::{AxisSignals, Block};
use super::planner::{max_junction_speed, JunctionRef};
use super::request::{MoveRequest, Positioning, ResolvedMove};
use super::timing::{acceleration_rate, MAX_STEP_RATE};

/// A translated Block together with the planned position it leads to.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    /// The Block to queue.
    pub block: Block,
    target_mm: [f32; NUM_AXES],
}

/// Block Translator state.
#[derive(Debug, Clone)]
pub struct Translator {
    position_mm: [f32; NUM_AXES],
    position_steps: [i32; NUM_AXES],
    previous: Option<JunctionRef>,
}

impl Translator {
    /// Translator at the origin with an empty queue behind it.
    pub const fn new() -> Self {
        Self {
            position_mm: [0.0; NUM_AXES],
            position_steps: [0; NUM_AXES],
            previous: None,
        }
    }

    /// Restart from a known machine position with nothing queued.
    pub fn resync(&mut self, steps: &[i32; NUM_AXES], steps_per_mm: &[f32; NUM_AXES]) {
        self.position_steps = *steps;
        self.position_mm = core::array::from_fn(|i| Steps(steps[i]).to_mm(steps_per_mm[i]).0);
        self.previous = None;
    }

    /// Position the last queued Block ends at, in steps.
    #[inline]
    pub fn planned_steps(&self) -> [i32; NUM_AXES] {
        self.position_steps
    }

    /// Position the last queued Block ends at, in millimeters.
    #[inline]
    pub fn planned_mm(&self) -> [f32; NUM_AXES] {
        self.position_mm
    }

    /// Build the Block for `request`.
    ///
    /// Returns `Ok(None)` when the request does not move any axis by a
    /// whole step. Nothing is changed until [`commit`](Self::commit).
    pub fn translate(
        &self,
        request: &MoveRequest,
        config: &MachineConfig,
    ) -> Result<Option<Translation>> {
        if let Some(feed) = request.feedrate {
            if !feed.0.is_finite() || feed.0 <= 0.0 {
                return Err(MotionError::InvalidFeedrate(feed.0).into());
            }
        }

        let mut target_mm = self.position_mm;
        let mut target_steps = self.position_steps;
        let mut named = [None; NUM_AXES];
        for axis in Axis::ALL {
            let Some(value) = request.target(axis) else {
                continue;
            };
            if !value.is_finite() {
                return Err(MotionError::NonFiniteTarget { axis }.into());
            }

            let i = axis.index();
            target_mm[i] = match request.positioning {
                Positioning::Absolute => value,
                Positioning::Relative => self.position_mm[i] + value,
            };
            target_steps[i] =
                Steps::from_mm(Millimeters(target_mm[i]), config.axis(axis).steps_per_mm).0;
            named[i] = Some(target_mm[i]);
        }

        let deltas: [i64; NUM_AXES] =
            core::array::from_fn(|i| target_steps[i] as i64 - self.position_steps[i] as i64);
        let steps = deltas.map(|d| d.unsigned_abs().min(u32::MAX as u64) as u32);
        let step_event_count = steps.iter().copied().max().unwrap_or(0);
        if step_event_count == 0 {
            debug!("dropping zero-length move");
            return Ok(None);
        }

        let delta_mm: [f32; NUM_AXES] = core::array::from_fn(|i| {
            deltas[i] as f32 / config.axis(Axis::ALL[i]).steps_per_mm
        });
        let millimeters = sqrtf(delta_mm.iter().map(|d| d * d).sum());
        let moving = move || Axis::ALL.into_iter().filter(move |a| steps[a.index()] != 0);

        let requested = match request.feedrate {
            Some(feed) => feed.0,
            None => moving()
                .map(|a| config.axis(a).avg_feedrate.0)
                .fold(f32::INFINITY, f32::min),
        };
        let min_feed = moving()
            .map(|a| config.axis(a).min_feedrate.0)
            .fold(0.0, f32::max);
        let mut speed = requested.max(min_feed);

        // Scale the whole move until every axis is within its own limit
        for axis in moving() {
            let component = speed * delta_mm[axis.index()].abs() / millimeters;
            let limit = config.axis(axis).max_feedrate.0;
            if component > limit {
                speed *= limit / component;
                debug!("feed limited by {} axis to {} mm/s", axis, speed);
            }
        }

        let timer = &config.timer;
        let mut nominal_rate = ceilf(step_event_count as f32 * speed / millimeters) as u32;
        if nominal_rate > MAX_STEP_RATE {
            speed *= MAX_STEP_RATE as f32 / nominal_rate as f32;
            nominal_rate = MAX_STEP_RATE;
            warn!("step rate limited, speed now {} mm/s", speed);
        }
        let nominal_rate = nominal_rate.max(timer.min_step_rate);

        let acceleration = moving()
            .map(|a| config.axis(a).max_acceleration.0 * millimeters / delta_mm[a.index()].abs())
            .fold(f32::INFINITY, f32::min);
        let acceleration_st = acceleration * step_event_count as f32 / millimeters;

        let mut block = Block {
            steps,
            directions: deltas.map(Direction::from_steps),
            step_event_count,
            millimeters,
            nominal_speed: speed,
            nominal_velocity: delta_mm.map(|d| speed * d / millimeters),
            nominal_rate,
            acceleration,
            acceleration_st,
            acceleration_rate: acceleration_rate(acceleration_st, timer.frequency_hz),
            safe_speed: config.planner.safe_speed().min(speed),
            start_position: self.position_steps,
            end_position: target_steps,
            request: ResolvedMove {
                target: named,
                feedrate: request.feedrate,
            },
            ..Block::EMPTY
        };

        for axis in moving() {
            let axis_config = config.axis(axis);
            let direction = block.directions[axis.index()];
            block.signals[axis.index()] = AxisSignals {
                direction_high: axis_config.direction_level(direction),
                enable_high: axis_config.enable_active_high,
                limit: axis_config.endstops.probe_for(direction),
            };
        }

        block.max_entry_speed =
            max_junction_speed(self.previous.as_ref(), &block, config.planner.max_jerk.0);
        block.entry_speed = block.safe_speed;
        block.exit_speed = block.safe_speed;
        block.recalculate_trapezoid(timer.min_step_rate);

        Ok(Some(Translation { block, target_mm }))
    }

    /// Advance the planned position past a queued translation.
    pub fn commit(&mut self, translation: &Translation) {
        self.position_mm = translation.target_mm;
        self.position_steps = translation.block.end_position;
        self.previous = Some(JunctionRef::from(&translation.block));
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
