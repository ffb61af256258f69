//! Owned motion context and its main-loop handle.
//!
//! A [`MotionCore`] holds everything the main loop and the step interrupt
//! share: the plan buffer, axis positions and a few flags. It is `const`
//! constructible so it can live in a `static`, and is split once into a
//! [`Planner`] for the main loop and a [`Stepper`] for the interrupt.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use heapless::Vec;

use crate::config::units::{Millimeters, MmPerSec, Steps};
use crate::config::{validate_axis, validate_config, validate_planner, AxisConfig, MachineConfig};
use crate::error::{BufferError, Result};
use crate::hal::{StepTimer, StepperIo};

use super::axis::{Axis, AxisState, NUM_AXES};
use super::block::Block;
use super::buffer::PlanBuffer;
use super::planner::{plan_window, Start};
use super::request::{MoveRequest, ResolvedMove};
use super::stepper::Stepper;
use super::timing::{RateTable, MAX_STEP_RATE};
use super::translator::Translator;

/// State shared between the main loop and the step interrupt.
///
/// `N` is the plan buffer capacity in Blocks and must be at least 2.
///
/// # Example
///
/// ```rust
/// use stepper_planner::hal::sim::{SimIo, VirtualTimer};
/// use stepper_planner::{MachineConfig, MotionCore, MoveRequest};
///
/// let timer = VirtualTimer::new();
/// let mut core: MotionCore<16> = MotionCore::new();
/// let (mut planner, mut stepper) = core
///     .split(MachineConfig::default(), SimIo::new(), &timer)
///     .unwrap();
///
/// planner.submit(&MoveRequest::absolute().x(10.0)).unwrap();
/// while timer.fire() {
///     stepper.tick();
/// }
/// assert_eq!(planner.position_steps()[0], 800);
/// ```
pub struct MotionCore<const N: usize> {
    pub(crate) buffer: PlanBuffer<N>,
    pub(crate) axes: AxisState,
    pub(crate) replan_pending: AtomicBool,
    pub(crate) endstop_hits: AtomicU8,
    pub(crate) endstops_enabled: AtomicBool,
    pub(crate) io_faults: AtomicU32,
    pub(crate) in_tick: AtomicBool,
}

impl<const N: usize> MotionCore<N> {
    const CAPACITY_CHECK: () = assert!(N >= 2, "plan buffer needs at least 2 slots");

    /// Empty core with every axis at the origin.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;
        Self {
            buffer: PlanBuffer::new(),
            axes: AxisState::new(),
            replan_pending: AtomicBool::new(false),
            endstop_hits: AtomicU8::new(0),
            endstops_enabled: AtomicBool::new(true),
            io_faults: AtomicU32::new(0),
            in_tick: AtomicBool::new(false),
        }
    }

    /// Validate `config` and hand out the main-loop and interrupt handles.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn split<'a, IO, T>(
        &'a mut self,
        config: MachineConfig,
        io: IO,
        timer: &'a T,
    ) -> Result<(Planner<'a, T, N>, Stepper<'a, IO, T, N>)>
    where
        IO: StepperIo,
        T: StepTimer,
    {
        validate_config(&config)?;
        let core: &'a Self = self;

        let rates = RateTable::new(&config.timer);
        let mut translator = Translator::new();
        translator.resync(&core.axes.snapshot(), &config.axes.steps_per_mm());
        info!("motion core ready, {} slots", N);

        let planner = Planner {
            core,
            timer,
            wake_period: config.timer.frequency_hz / MAX_STEP_RATE,
            config,
            translator,
            report: None,
        };
        Ok((planner, Stepper::new(core, io, timer, rates)))
    }

    /// Copy of every queued Block, head first.
    pub fn snapshot(&self) -> Vec<Block, N> {
        self.buffer.snapshot()
    }

    /// An endstop abort is waiting for [`Planner::poll`].
    pub fn replan_pending(&self) -> bool {
        self.replan_pending.load(Ordering::Acquire)
    }

    /// Current axis positions in steps.
    pub fn position_steps(&self) -> [i32; NUM_AXES] {
        self.axes.snapshot()
    }
}

impl<const N: usize> Default for MotionCore<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful [`Planner::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Submission {
    /// A Block was queued.
    Queued,
    /// The move was shorter than one step on every axis and was ignored.
    Dropped,
}

/// Outcome of an endstop-triggered invalidate-and-replan.
///
/// Informational: the machine stopped short on the flagged axes and the
/// queued moves were re-translated from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortReport {
    /// Axes whose limit switch tripped.
    pub axes: [bool; NUM_AXES],
    /// Axis positions (steps) after the abort.
    pub position: [i32; NUM_AXES],
    /// Moves queued again.
    pub resubmitted: usize,
    /// Moves that produced no Block when re-translated.
    pub dropped: usize,
}

impl AbortReport {
    fn merge(self, later: AbortReport) -> AbortReport {
        AbortReport {
            axes: core::array::from_fn(|i| self.axes[i] || later.axes[i]),
            position: later.position,
            resubmitted: later.resubmitted,
            dropped: self.dropped + later.dropped,
        }
    }
}

/// Main-loop handle of a [`MotionCore`]: translation, planning and status.
pub struct Planner<'a, T: StepTimer, const N: usize> {
    core: &'a MotionCore<N>,
    timer: &'a T,
    wake_period: u32,
    config: MachineConfig,
    translator: Translator,
    report: Option<AbortReport>,
}

impl<'a, T: StepTimer, const N: usize> Planner<'a, T, N> {
    /// Queue a move.
    ///
    /// Services a pending endstop abort first; its report is kept for the
    /// next [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// - [`BufferError::Full`] if no slot is free; retry the same request later
    /// - [`MotionError`](crate::MotionError) if the request is malformed
    pub fn submit(&mut self, request: &MoveRequest) -> Result<Submission> {
        if let Some(report) = self.service_abort() {
            self.report = Some(match self.report.take() {
                Some(earlier) => earlier.merge(report),
                None => report,
            });
        }
        self.enqueue(request)
    }

    /// Service a pending endstop abort.
    ///
    /// Returns the report of any abort handled since the last call.
    pub fn poll(&mut self) -> Option<AbortReport> {
        let fresh = self.service_abort();
        match (self.report.take(), fresh) {
            (Some(earlier), Some(report)) => Some(earlier.merge(report)),
            (earlier, report) => earlier.or(report),
        }
    }

    fn enqueue(&mut self, request: &MoveRequest) -> Result<Submission> {
        let core = self.core;
        let buffer = &core.buffer;
        if buffer.is_full() {
            debug!("plan buffer full");
            return Err(BufferError::Full { capacity: N }.into());
        }

        let Some(translation) = self.translator.translate(request, &self.config)? else {
            return Ok(Submission::Dropped);
        };
        buffer.push(&translation.block)?;
        self.translator.commit(&translation);
        self.plan();

        if !self.timer.is_armed() {
            self.timer.arm(self.wake_period);
        }
        Ok(Submission::Queued)
    }

    fn service_abort(&mut self) -> Option<AbortReport> {
        let core = self.core;
        if !core.replan_pending.load(Ordering::Acquire) {
            return None;
        }

        let mut moves: Vec<ResolvedMove, N> = Vec::new();
        let hits = critical_section::with(|cs| {
            core.buffer.drain_pending(cs, &mut moves);
            core.replan_pending.store(false, Ordering::Release);
            let hits = core.endstop_hits.load(Ordering::Relaxed);
            core.endstop_hits.store(0, Ordering::Relaxed);
            hits
        });

        let position = core.axes.snapshot();
        self.translator.resync(&position, &self.config.axes.steps_per_mm());
        info!("endstop abort, replanning {} moves", moves.len());

        let mut resubmitted = 0;
        let mut dropped = 0;
        for resolved in moves {
            match self.enqueue(&MoveRequest::from(resolved)) {
                Ok(Submission::Queued) => resubmitted += 1,
                _ => dropped += 1,
            }
        }

        Some(AbortReport {
            axes: Axis::ALL.map(|axis| hits & axis.mask() != 0),
            position,
            resubmitted,
            dropped,
        })
    }

    /// Replan every queued Block that is not executing.
    ///
    /// Runs automatically after each enqueue. Running it again without an
    /// enqueue in between changes nothing.
    pub fn plan(&mut self) {
        let core = self.core;
        let buffer = &core.buffer;
        let min_rate = self.config.timer.min_step_rate;
        let (head, tail) = buffer.bounds();
        if head == tail {
            return;
        }

        let (first, start) = if buffer.is_busy(head) {
            (head.wrapping_add(1), Start::Pinned(buffer.read(head).exit_speed))
        } else {
            (head, Start::Standstill)
        };

        let mut window: Vec<Block, N> = Vec::new();
        for k in 0..tail.wrapping_sub(first) {
            let _ = window.push(buffer.read(first.wrapping_add(k)));
        }
        plan_window(&mut window, start, min_rate);

        // Blocks latched during the pass keep their old plan; the rest of
        // the window is replanned behind the speed they will leave with.
        for k in 0..window.len() {
            let index = first.wrapping_add(k);
            if !buffer.write_unless_busy(index, &window[k]) {
                let exit = buffer.read(index).exit_speed;
                plan_window(&mut window[k + 1..], Start::Pinned(exit), min_rate);
            }
        }
    }

    /// Axis positions in steps.
    pub fn position_steps(&self) -> [i32; NUM_AXES] {
        self.core.axes.snapshot()
    }

    /// Axis positions in millimeters.
    pub fn position(&self) -> [Millimeters; NUM_AXES] {
        let steps = self.position_steps();
        let spm = self.config.axes.steps_per_mm();
        core::array::from_fn(|i| Steps(steps[i]).to_mm(spm[i]))
    }

    /// Where the last queued move ends, in millimeters.
    pub fn planned_position(&self) -> [Millimeters; NUM_AXES] {
        self.translator.planned_mm().map(Millimeters)
    }

    /// Whether any Block is queued or executing.
    ///
    /// False while an endstop abort waits for [`poll`](Self::poll): the
    /// stepper is idle and the queued Blocks are about to be replanned.
    #[inline]
    pub fn is_moving(&self) -> bool {
        !self.core.buffer.is_empty() && !self.core.replan_pending.load(Ordering::Acquire)
    }

    /// Queued Blocks, including one being executed.
    #[inline]
    pub fn queued(&self) -> usize {
        self.core.buffer.len()
    }

    /// Free plan buffer slots.
    #[inline]
    pub fn free_capacity(&self) -> usize {
        N - self.queued().min(N)
    }

    /// Pin errors seen by the step engine since start.
    pub fn io_faults(&self) -> u32 {
        self.core.io_faults.load(Ordering::Relaxed)
    }

    /// Copy of every queued Block, head first.
    pub fn snapshot(&self) -> Vec<Block, N> {
        self.core.snapshot()
    }

    /// Active configuration.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Replace one axis's configuration for moves queued from now on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error and keeps the prior values if `config`
    /// fails validation.
    pub fn set_axis_config(&mut self, axis: Axis, config: AxisConfig) -> Result<()> {
        if let Err(e) = validate_axis(axis, &config) {
            warn!("rejected configuration for {} axis", axis);
            return Err(e);
        }
        *self.config.axes.get_mut(axis) = config;
        Ok(())
    }

    /// Change the junction jerk limit for moves queued from now on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error and keeps the prior value if `max_jerk`
    /// is not positive and finite.
    pub fn set_max_jerk(&mut self, max_jerk: MmPerSec) -> Result<()> {
        let mut planner = self.config.planner;
        planner.max_jerk = max_jerk;
        if let Err(e) = validate_planner(&planner) {
            warn!("rejected max jerk {}", max_jerk.0);
            return Err(e);
        }
        self.config.planner = planner;
        Ok(())
    }

    /// Turn endstop checking on or off for every axis.
    pub fn set_endstops_enabled(&self, enabled: bool) {
        self.core.endstops_enabled.store(enabled, Ordering::Release);
    }
}
