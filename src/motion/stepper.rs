//! Step Engine - real-time step pulse generation.
//!
//! [`Stepper::tick`] is called from the step timer interrupt. Each call emits
//! one Bresenham step event for the Block at the head of the plan buffer and
//! reprograms the timer for the next event according to the Block's
//! trapezoid. It never blocks, allocates or returns an error.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::{StepTimer, StepperIo};

use super::axis::{Axis, NUM_AXES};
use super::block::Block;
use super::bresenham::Bresenham;
use super::core::MotionCore;
use super::profile::MotionPhase;
use super::timing::RateTable;

/// What a call to [`Stepper::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Nothing to execute; the timer was disarmed.
    Idle,
    /// One step event was executed.
    Stepped,
    /// The current Block finished on this event.
    Retired,
    /// Called while a tick was already running; did nothing.
    Skipped,
}

/// Clears the in-tick flag on every exit path.
struct ReentryGuard<'a>(&'a AtomicBool);

impl<'a> ReentryGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        // Load and store only; the flag is never raced by the main loop
        if flag.load(Ordering::Acquire) {
            return None;
        }
        flag.store(true, Ordering::Release);
        Some(Self(flag))
    }
}

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runtime state of the Block being executed.
#[derive(Debug, Clone)]
struct Execution {
    index: usize,
    block: Block,
    line: Bresenham,
    done: [u32; NUM_AXES],
    halted: u8,
    completed: u32,
    rate: u32,
    peak_rate: u32,
    accel_time: u32,
    decel_time: u32,
    phase: MotionPhase,
}

impl Execution {
    fn finished(&self) -> bool {
        if self.completed >= self.block.step_event_count {
            return true;
        }
        Axis::ALL.iter().all(|&axis| {
            let i = axis.index();
            self.halted & axis.mask() != 0 || self.done[i] >= self.block.steps[i]
        })
    }

    /// Position after this Block, accounting for halted axes.
    fn reached_position(&self) -> [i32; NUM_AXES] {
        if self.halted == 0 {
            return self.block.end_position;
        }
        core::array::from_fn(|i| {
            let travelled = self.done[i] as i64 * self.block.directions[i].sign() as i64;
            (self.block.start_position[i] as i64 + travelled) as i32
        })
    }
}

/// Interrupt-side handle of a [`MotionCore`].
///
/// Generic over:
/// - `IO`: machine pins (must implement [`StepperIo`])
/// - `T`: the step timer (must implement [`StepTimer`])
pub struct Stepper<'a, IO: StepperIo, T: StepTimer, const N: usize> {
    core: &'a MotionCore<N>,
    io: IO,
    timer: &'a T,
    rates: RateTable,
    current: Option<Execution>,
}

impl<'a, IO: StepperIo, T: StepTimer, const N: usize> Stepper<'a, IO, T, N> {
    pub(crate) fn new(core: &'a MotionCore<N>, io: IO, timer: &'a T, rates: RateTable) -> Self {
        Self {
            core,
            io,
            timer,
            rates,
            current: None,
        }
    }

    /// Execute one step event. Call from the step timer interrupt.
    pub fn tick(&mut self) -> TickOutcome {
        let core = self.core;
        let Some(_guard) = ReentryGuard::enter(&core.in_tick) else {
            return TickOutcome::Skipped;
        };

        if self.current.is_none() && !self.latch_next() {
            self.timer.disarm();
            return TickOutcome::Idle;
        }

        self.step()
    }

    /// Phase of the Block being executed.
    pub fn phase(&self) -> MotionPhase {
        self.current
            .as_ref()
            .map_or(MotionPhase::Complete, |exec| exec.phase)
    }

    /// Step rate programmed for the next event (steps/s), 0 when idle.
    pub fn current_rate(&self) -> u32 {
        self.current.as_ref().map_or(0, |exec| exec.rate)
    }

    /// Whether a Block is latched.
    #[inline]
    pub fn is_executing(&self) -> bool {
        self.current.is_some()
    }

    /// Access the pins, e.g. to inspect a simulation.
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Mutable access to the pins.
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    fn record_fault(&self) {
        let faults = &self.core.io_faults;
        faults.store(faults.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
    }

    /// Latch the head Block, unless an abort is waiting for the main loop.
    fn latch_next(&mut self) -> bool {
        let core = self.core;
        if core.replan_pending.load(Ordering::Acquire) {
            return false;
        }
        let Some(index) = core.buffer.head() else {
            return false;
        };

        let block = core.buffer.latch(index);
        for axis in Axis::ALL.into_iter().filter(|&axis| block.moves(axis)) {
            let signals = block.signals[axis.index()];
            if self.io.write_enable(axis, signals.enable_high).is_err() {
                self.record_fault();
            }
            if self.io.write_direction(axis, signals.direction_high).is_err() {
                self.record_fault();
            }
        }

        let rate = block.initial_rate;
        self.current = Some(Execution {
            index,
            line: Bresenham::new(block.steps, block.step_event_count),
            done: [0; NUM_AXES],
            halted: 0,
            completed: 0,
            rate,
            peak_rate: rate,
            accel_time: self.rates.period(rate),
            decel_time: 0,
            phase: block.trapezoid().phase_at(0, block.step_event_count),
            block,
        });
        true
    }

    fn step(&mut self) -> TickOutcome {
        let endstops = self.core.endstops_enabled.load(Ordering::Relaxed);
        let mut faults = 0u32;
        let Some(exec) = self.current.as_mut() else {
            return TickOutcome::Idle;
        };

        for axis in Axis::ALL {
            let i = axis.index();
            if exec.halted & axis.mask() != 0 || !exec.line.advance(i) {
                continue;
            }

            if endstops {
                if let Some(probe) = exec.block.signals[i].limit {
                    match self.io.read_limit(axis, probe.side) {
                        Ok(level) if level == probe.active_high => {
                            exec.halted |= axis.mask();
                            continue;
                        }
                        Ok(_) => {}
                        Err(_) => faults += 1,
                    }
                }
            }

            if self.io.pulse(axis).is_err() {
                faults += 1;
            }
            exec.line.commit(i);
            exec.done[i] += 1;
        }
        exec.completed += 1;

        let finished = exec.finished();
        if !finished {
            let period = next_period(exec, &self.rates);
            self.timer.arm(period);
        }
        for _ in 0..faults {
            self.record_fault();
        }

        if finished {
            self.retire();
            TickOutcome::Retired
        } else {
            TickOutcome::Stepped
        }
    }

    fn retire(&mut self) {
        let Some(exec) = self.current.take() else {
            return;
        };
        let core = self.core;

        core.axes.store_all(&exec.reached_position());
        if exec.halted != 0 {
            let hits = core.endstop_hits.load(Ordering::Relaxed) | exec.halted;
            core.endstop_hits.store(hits, Ordering::Relaxed);
            core.replan_pending.store(true, Ordering::Release);
            warn!("endstop hit, axis mask {=u8}", exec.halted);
        }
        core.buffer.retire(exec.index);

        if self.latch_next() {
            let rate = self.current.as_ref().map_or(0, |next| next.rate);
            self.timer.arm(self.rates.period(rate));
        } else {
            self.timer.disarm();
        }
    }
}

/// Advance the rate along the trapezoid and return the next timer period.
fn next_period(exec: &mut Execution, rates: &RateTable) -> u32 {
    let block = &exec.block;
    let n = exec.completed;
    let gained = |time: u32| ((time as u64 * block.acceleration_rate as u64) >> 24) as u32;

    let (rate, phase) = if n < block.accelerate_until {
        let rate = block
            .initial_rate
            .saturating_add(gained(exec.accel_time))
            .min(block.nominal_rate);
        exec.peak_rate = rate;
        (rate, MotionPhase::Accelerating)
    } else if n >= block.decelerate_after {
        let rate = exec
            .peak_rate
            .saturating_sub(gained(exec.decel_time))
            .max(block.final_rate);
        (rate, MotionPhase::Decelerating)
    } else {
        exec.peak_rate = block.nominal_rate;
        (block.nominal_rate, MotionPhase::Cruising)
    };

    let period = rates.period(rate);
    match phase {
        MotionPhase::Accelerating => exec.accel_time = exec.accel_time.saturating_add(period),
        MotionPhase::Decelerating => exec.decel_time = exec.decel_time.saturating_add(period),
        _ => {}
    }
    exec.rate = rate;
    exec.phase = phase;
    period
}
