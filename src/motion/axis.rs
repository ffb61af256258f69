//! Machine axes and the shared step position store.

use core::fmt;
use core::sync::atomic::{AtomicI32, Ordering};

/// Number of machine axes.
pub const NUM_AXES: usize = 4;

/// A machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X (Cartesian).
    X,
    /// Y (Cartesian).
    Y,
    /// Z (Cartesian).
    Z,
    /// Extruder.
    E,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; NUM_AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit of this axis in an axis mask.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::E => "E",
        };
        f.write_str(name)
    }
}

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward increasing coordinates.
    #[default]
    Positive,
    /// Toward decreasing coordinates.
    Negative,
}

impl Direction {
    /// Get direction from a signed step delta.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// Which end of travel a limit switch guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitSide {
    /// Negative end.
    Min,
    /// Positive end.
    Max,
}

/// Absolute step position of every axis.
///
/// Written only from the step interrupt. Readers take the whole group inside
/// a critical section so a multi-axis position is never observed half-updated.
pub struct AxisState {
    steps: [AtomicI32; NUM_AXES],
}

impl AxisState {
    /// All axes at the origin.
    pub const fn new() -> Self {
        Self {
            steps: [const { AtomicI32::new(0) }; NUM_AXES],
        }
    }

    /// Consistent copy of all axis positions.
    pub fn snapshot(&self) -> [i32; NUM_AXES] {
        critical_section::with(|_| self.steps.each_ref().map(|s| s.load(Ordering::Acquire)))
    }

    /// Position of one axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> i32 {
        self.steps[axis.index()].load(Ordering::Acquire)
    }

    /// Overwrite every axis position as one update.
    pub(crate) fn store_all(&self, position: &[i32; NUM_AXES]) {
        critical_section::with(|_| {
            for (slot, &value) in self.steps.iter().zip(position) {
                slot.store(value, Ordering::Release);
            }
        });
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}
