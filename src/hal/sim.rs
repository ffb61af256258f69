//! Host-side simulation of the step timer and machine pins.
//!
//! Drives the step engine without hardware: a manually advanced virtual
//! clock stands in for the interrupt timer, and recording pins track where
//! each axis actually ended up.

use core::cell::Cell;

use crate::motion::{Axis, LimitSide, Stepper, TickOutcome, NUM_AXES};

use super::{StepTimer, StepperIo};

/// Timer driven by hand instead of by hardware.
#[derive(Debug, Default)]
pub struct VirtualTimer {
    armed: Cell<bool>,
    period: Cell<u32>,
    now: Cell<u64>,
}

impl VirtualTimer {
    /// Disarmed timer at time zero.
    pub const fn new() -> Self {
        Self {
            armed: Cell::new(false),
            period: Cell::new(0),
            now: Cell::new(0),
        }
    }

    /// Let the next period elapse. Returns `false` if the timer is disarmed.
    pub fn fire(&self) -> bool {
        if !self.armed.get() {
            return false;
        }
        self.now.set(self.now.get() + self.period.get() as u64);
        true
    }

    /// Elapsed timer ticks.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Programmed period, if armed.
    pub fn period(&self) -> Option<u32> {
        self.armed.get().then(|| self.period.get())
    }
}

impl StepTimer for VirtualTimer {
    fn arm(&self, period: u32) {
        self.period.set(period);
        self.armed.set(true);
    }

    fn disarm(&self) {
        self.armed.set(false);
    }

    fn is_armed(&self) -> bool {
        self.armed.get()
    }
}

/// Error returned by a [`SimIo`] set to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFault;

#[derive(Debug, Clone, Copy)]
struct SimLimit {
    side: LimitSide,
    at: i32,
    active_high: bool,
}

/// Recording pins with optional limit switches.
///
/// Each pulse moves the simulated axis one step in the direction its DIR pin
/// currently selects. A limit switch trips once the axis reaches its trip
/// point.
#[derive(Debug, Clone, Default)]
pub struct SimIo {
    /// Pulses emitted per axis.
    pub pulses: [u32; NUM_AXES],
    /// Net simulated axis position in steps.
    pub position: [i32; NUM_AXES],
    /// Last direction level written per axis.
    pub direction_high: [bool; NUM_AXES],
    /// Last enable level written per axis, if any.
    pub enable_high: [Option<bool>; NUM_AXES],
    /// Limit switch samples taken.
    pub limit_reads: u32,
    inverted: [bool; NUM_AXES],
    limits: [Option<SimLimit>; NUM_AXES],
    failing: bool,
}

impl SimIo {
    /// Pins with no switches fitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit a switch at `side` of `axis` that trips at `at` steps.
    pub fn with_limit(mut self, axis: Axis, side: LimitSide, at: i32, active_high: bool) -> Self {
        self.limits[axis.index()] = Some(SimLimit {
            side,
            at,
            active_high,
        });
        self
    }

    /// DIR high means negative travel on `axis`.
    pub fn with_inverted_direction(mut self, axis: Axis) -> Self {
        self.inverted[axis.index()] = true;
        self
    }

    /// Make every pin operation fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> Result<(), SimFault> {
        if self.failing {
            Err(SimFault)
        } else {
            Ok(())
        }
    }
}

impl StepperIo for SimIo {
    type Error = SimFault;

    fn write_direction(&mut self, axis: Axis, high: bool) -> Result<(), SimFault> {
        self.check()?;
        self.direction_high[axis.index()] = high;
        Ok(())
    }

    fn write_enable(&mut self, axis: Axis, high: bool) -> Result<(), SimFault> {
        self.check()?;
        self.enable_high[axis.index()] = Some(high);
        Ok(())
    }

    fn pulse(&mut self, axis: Axis) -> Result<(), SimFault> {
        self.check()?;
        let i = axis.index();
        let positive = self.direction_high[i] != self.inverted[i];
        self.pulses[i] += 1;
        self.position[i] += if positive { 1 } else { -1 };
        Ok(())
    }

    fn read_limit(&mut self, axis: Axis, side: LimitSide) -> Result<bool, SimFault> {
        self.check()?;
        self.limit_reads += 1;
        let i = axis.index();
        let triggered = match self.limits[i] {
            Some(limit) if limit.side == side => match side {
                LimitSide::Min => self.position[i] <= limit.at,
                LimitSide::Max => self.position[i] >= limit.at,
            },
            _ => false,
        };
        let active_high = self.limits[i].map_or(true, |l| l.active_high);
        Ok(triggered == active_high)
    }
}

/// Fire `timer` and tick `stepper` until the timer stops or `max_ticks` run.
///
/// Returns the number of ticks executed.
pub fn run_until_idle<IO, const N: usize>(
    stepper: &mut Stepper<'_, IO, VirtualTimer, N>,
    timer: &VirtualTimer,
    max_ticks: usize,
) -> usize
where
    IO: StepperIo,
{
    let mut ticks = 0;
    while ticks < max_ticks && timer.fire() {
        if stepper.tick() == TickOutcome::Idle {
            break;
        }
        ticks += 1;
    }
    ticks
}
