//! Multi-axis integer line rasterizer.
//!
//! Every axis shares one step event clock of `step_event_count` ticks. Each
//! axis accumulates its own delta per tick and steps whenever its counter
//! crosses zero, which spreads its steps evenly over the move.

use super::axis::NUM_AXES;

/// Bresenham state for one Block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bresenham {
    deltas: [u32; NUM_AXES],
    counters: [i64; NUM_AXES],
    step_event_count: u32,
}

impl Bresenham {
    /// Start a line with the given per-axis deltas.
    ///
    /// Counters start at `-(step_event_count / 2)` so steps land in the
    /// middle of their interval.
    pub fn new(deltas: [u32; NUM_AXES], step_event_count: u32) -> Self {
        let start = -((step_event_count / 2) as i64);
        Self {
            deltas,
            counters: [start; NUM_AXES],
            step_event_count,
        }
    }

    /// Advance one axis by one event. Returns `true` if a step is due.
    ///
    /// A due step must be confirmed with [`commit`](Self::commit) before the
    /// next event on that axis.
    #[inline]
    pub fn advance(&mut self, axis: usize) -> bool {
        let delta = self.deltas[axis];
        if delta == 0 {
            return false;
        }
        self.counters[axis] += delta as i64;
        self.counters[axis] >= 0
    }

    /// Account for a step taken on `axis`.
    #[inline]
    pub fn commit(&mut self, axis: usize) {
        self.counters[axis] -= self.step_event_count as i64;
    }

    /// Advance every axis by one event and take every due step.
    ///
    /// Returns a mask of the axes that stepped.
    pub fn tick(&mut self) -> u8 {
        let mut mask = 0;
        for axis in 0..NUM_AXES {
            if self.advance(axis) {
                self.commit(axis);
                mask |= 1 << axis;
            }
        }
        mask
    }
}
