//! Unit types for physical quantities.
//!
//! Distances, feed rates and accelerations are kept in their own newtypes so
//! configuration values cannot be mixed up with raw step counts.

use serde::Deserialize;

/// Linear position or distance in millimeters.
///
/// Used for the user-facing API. Internally converted to [`Steps`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Linear speed in millimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSec(pub f32);

impl MmPerSec {
    /// Convert a feed rate given in millimeters per minute (G-code `F` words).
    #[inline]
    pub fn from_mm_per_min(value: f32) -> Self {
        Self(value / 60.0)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Feed rate in millimeters per minute.
    #[inline]
    pub fn to_mm_per_min(self) -> f32 {
        self.0 * 60.0
    }
}

/// Linear acceleration in millimeters per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSecSquared(pub f32);

/// Axis position in steps (absolute from origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i32);

impl Steps {
    /// Convert to millimeters using the axis steps per millimeter.
    #[inline]
    pub fn to_mm(self, steps_per_mm: f32) -> Millimeters {
        Millimeters(self.0 as f32 / steps_per_mm)
    }

    /// Create from millimeters, rounding to the nearest step.
    #[inline]
    pub fn from_mm(mm: Millimeters, steps_per_mm: f32) -> Self {
        Self(libm::roundf(mm.0 * steps_per_mm) as i32)
    }
}
