//! Motion module for stepper-planner.
//!
//! Provides move translation, look-ahead planning, the shared plan buffer and
//! the interrupt-driven step engine.

mod axis;
mod block;
pub mod bresenham;
mod buffer;
mod core;
pub mod planner;
mod profile;
mod request;
mod stepper;
mod timing;
mod translator;

pub use self::core::{AbortReport, MotionCore, Planner, Submission};
pub use axis::{Axis, AxisState, Direction, LimitSide, NUM_AXES};
pub use block::{AxisSignals, Block, LimitProbe};
pub use bresenham::Bresenham;
pub use buffer::PlanBuffer;
pub use profile::{estimate_distance, intersection_distance, MotionPhase, Trapezoid};
pub use request::{MoveRequest, Positioning, ResolvedMove};
pub use stepper::{Stepper, TickOutcome};
pub use timing::{acceleration_rate, RateTable, MAX_STEP_RATE};
pub use translator::{Translation, Translator};
