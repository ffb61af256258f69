//! Configuration module for stepper-planner.
//!
//! Provides types for loading and validating axis, planner and step timer
//! settings from TOML files (with `std` feature) or pre-parsed data.

mod axis;
mod planner;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use axis::{AxesConfig, AxisConfig, EndstopConfig};
pub use planner::{PlannerConfig, TimerConfig};
pub use system::MachineConfig;
pub use validation::{validate_axis, validate_config, validate_planner, validate_timer};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, MmPerSec, MmPerSecSquared, Steps};
