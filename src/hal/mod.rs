//! Hardware boundary.
//!
//! The step engine talks to the machine through two traits: [`StepperIo`]
//! for pins and [`StepTimer`] for the interrupt timer that paces it. Pin
//! adapters over embedded-hal 1.0 are provided; timers are board specific.

use core::convert::Infallible;

use embedded_hal::digital::{Error as _, ErrorKind, ErrorType, InputPin, OutputPin, PinState};

use crate::motion::{Axis, LimitSide};

pub mod sim;

/// Pin access for every axis, in raw electrical levels.
pub trait StepperIo {
    /// Pin error type.
    type Error;

    /// Drive the direction pin of `axis`.
    fn write_direction(&mut self, axis: Axis, high: bool) -> Result<(), Self::Error>;

    /// Drive the enable pin of `axis`.
    fn write_enable(&mut self, axis: Axis, high: bool) -> Result<(), Self::Error>;

    /// Emit one step pulse on `axis`.
    fn pulse(&mut self, axis: Axis) -> Result<(), Self::Error>;

    /// Sample the limit switch at `side` of `axis`. Returns the pin level.
    fn read_limit(&mut self, axis: Axis, side: LimitSide) -> Result<bool, Self::Error>;
}

/// The timer that invokes [`Stepper::tick`](crate::Stepper::tick).
///
/// Methods take `&self` since the timer is shared between the main loop,
/// which wakes it, and the interrupt, which reprograms it. Implementations
/// write hardware registers or interior-mutable state.
pub trait StepTimer {
    /// Start (or restart) firing every `period` timer ticks.
    fn arm(&self, period: u32);

    /// Stop firing.
    fn disarm(&self);

    /// Whether the timer is firing.
    fn is_armed(&self) -> bool;
}

/// Placeholder for a pin that is not fitted.
///
/// Writes are ignored and reads return low.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Pin access for a single axis.
pub trait AxisIo {
    /// Drive the direction pin.
    fn write_direction(&mut self, high: bool) -> Result<(), ErrorKind>;
    /// Drive the enable pin.
    fn write_enable(&mut self, high: bool) -> Result<(), ErrorKind>;
    /// Emit one step pulse.
    fn pulse(&mut self) -> Result<(), ErrorKind>;
    /// Sample a limit switch.
    fn read_limit(&mut self, side: LimitSide) -> Result<bool, ErrorKind>;
}

/// Driver pins of one axis.
///
/// Generic over:
/// - `STEP`, `DIR`, `EN`: output pins (must implement `OutputPin`)
/// - `MIN`, `MAX`: limit switch inputs (must implement `InputPin`), [`NoPin`]
///   when not fitted
pub struct AxisPins<STEP, DIR, EN, MIN = NoPin, MAX = NoPin> {
    /// STEP pin (one pulse per step).
    pub step: STEP,
    /// DIR pin.
    pub dir: DIR,
    /// Driver enable pin.
    pub enable: EN,
    /// Negative end limit switch.
    pub min_limit: MIN,
    /// Positive end limit switch.
    pub max_limit: MAX,
}

impl<STEP, DIR, EN> AxisPins<STEP, DIR, EN> {
    /// Axis without limit switches.
    pub fn new(step: STEP, dir: DIR, enable: EN) -> Self {
        Self {
            step,
            dir,
            enable,
            min_limit: NoPin,
            max_limit: NoPin,
        }
    }
}

impl<STEP, DIR, EN, MIN, MAX> AxisPins<STEP, DIR, EN, MIN, MAX> {
    /// Attach limit switch inputs.
    pub fn with_limits<MIN2, MAX2>(
        self,
        min_limit: MIN2,
        max_limit: MAX2,
    ) -> AxisPins<STEP, DIR, EN, MIN2, MAX2> {
        AxisPins {
            step: self.step,
            dir: self.dir,
            enable: self.enable,
            min_limit,
            max_limit,
        }
    }
}

fn write_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), ErrorKind> {
    pin.set_state(PinState::from(high)).map_err(|e| e.kind())
}

impl<STEP, DIR, EN, MIN, MAX> AxisIo for AxisPins<STEP, DIR, EN, MIN, MAX>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MIN: InputPin,
    MAX: InputPin,
{
    fn write_direction(&mut self, high: bool) -> Result<(), ErrorKind> {
        write_level(&mut self.dir, high)
    }

    fn write_enable(&mut self, high: bool) -> Result<(), ErrorKind> {
        write_level(&mut self.enable, high)
    }

    /// Rising then falling edge. Drivers that need a longer high time than
    /// two pin writes take must stretch it in their `OutputPin`.
    fn pulse(&mut self) -> Result<(), ErrorKind> {
        self.step.set_high().map_err(|e| e.kind())?;
        self.step.set_low().map_err(|e| e.kind())
    }

    fn read_limit(&mut self, side: LimitSide) -> Result<bool, ErrorKind> {
        match side {
            LimitSide::Min => self.min_limit.is_high().map_err(|e| e.kind()),
            LimitSide::Max => self.max_limit.is_high().map_err(|e| e.kind()),
        }
    }
}

/// Pins of all four axes.
pub struct PinBank<X, Y, Z, E> {
    /// X axis pins.
    pub x: X,
    /// Y axis pins.
    pub y: Y,
    /// Z axis pins.
    pub z: Z,
    /// Extruder pins.
    pub e: E,
}

impl<X: AxisIo, Y: AxisIo, Z: AxisIo, E: AxisIo> PinBank<X, Y, Z, E> {
    fn axis(&mut self, axis: Axis) -> &mut dyn AxisIo {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::E => &mut self.e,
        }
    }
}

impl<X: AxisIo, Y: AxisIo, Z: AxisIo, E: AxisIo> StepperIo for PinBank<X, Y, Z, E> {
    type Error = ErrorKind;

    fn write_direction(&mut self, axis: Axis, high: bool) -> Result<(), ErrorKind> {
        self.axis(axis).write_direction(high)
    }

    fn write_enable(&mut self, axis: Axis, high: bool) -> Result<(), ErrorKind> {
        self.axis(axis).write_enable(high)
    }

    fn pulse(&mut self, axis: Axis) -> Result<(), ErrorKind> {
        self.axis(axis).pulse()
    }

    fn read_limit(&mut self, axis: Axis, side: LimitSide) -> Result<bool, ErrorKind> {
        self.axis(axis).read_limit(side)
    }
}
