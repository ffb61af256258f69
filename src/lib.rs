//! # stepper-planner
//!
//! Look-ahead motion planning and interrupt-driven step generation for
//! multi-axis stepper machines (3D printers, small CNCs).
//!
//! ## Features
//!
//! - **Look-ahead planning**: junction speeds limited by a jerk bound, with
//!   reverse and forward passes over the queued moves
//! - **Trapezoidal profiles**: per-Block acceleration, cruise and deceleration
//!   expressed in step events
//! - **Bresenham stepping**: exact multi-axis step distribution at a variable
//!   timer rate
//! - **Endstop aborts**: truncated moves are reported and the queue replanned
//! - **embedded-hal 1.0**: pin adapters over `OutputPin` / `InputPin`
//! - **no_std compatible**: no allocation, `const` constructible core
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_planner::{MachineConfig, MotionCore, MoveRequest, MmPerSec};
//!
//! let mut core: MotionCore<16> = MotionCore::new();
//! let config: MachineConfig = stepper_planner::load_config("machine.toml")?;
//! let (mut planner, mut stepper) = core.split(config, pins, &timer)?;
//!
//! // Main loop
//! planner.submit(&MoveRequest::absolute().x(120.0).feedrate(MmPerSec::from_mm_per_min(3000.0)))?;
//! if let Some(report) = planner.poll() {
//!     // endstop hit, report.position holds where the machine stopped
//! }
//!
//! // Step timer interrupt
//! stepper.tick();
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod hal;
pub mod motion;

// Re-exports for ergonomic API
pub use config::{
    validate_config, AxesConfig, AxisConfig, EndstopConfig, MachineConfig, PlannerConfig,
    TimerConfig,
};
pub use error::{BufferError, ConfigError, Error, MotionError, Result};
pub use hal::{AxisPins, NoPin, PinBank, StepTimer, StepperIo};
pub use motion::{
    AbortReport, Axis, Block, Direction, MotionCore, MotionPhase, MoveRequest, Planner,
    Positioning, Stepper, Submission, TickOutcome, NUM_AXES,
};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Millimeters, MmPerSec, MmPerSecSquared, Steps};
