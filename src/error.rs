//! Error types for stepper-planner.
//!
//! Provides unified error handling across configuration, plan buffer capacity
//! and move translation. The real-time step path never produces these; it
//! reports anomalies through flags read by the main loop instead.

use core::fmt;

use crate::motion::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-planner operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Plan buffer capacity error
    Buffer(BufferError),
    /// Move request error
    Motion(MotionError),
}

/// Configuration-related errors.
///
/// A configuration update that fails validation is ignored and the prior
/// configuration stays in effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps per millimeter must be finite and > 0
    InvalidStepsPerMm {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Feed rates must be finite, max/avg > 0, and min <= max
    InvalidFeedrate {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Max acceleration must be finite and > 0
    InvalidAcceleration {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Junction jerk limit must be finite and > 0
    InvalidJerk(f32),
    /// Step timer frequency too low for the supported step rates
    InvalidTimerFrequency(u32),
    /// Minimum step rate must be within 1..=MAX_STEP_RATE
    InvalidMinStepRate(u32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Plan buffer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Buffer has no free slot; retry the same request later
    Full {
        /// Buffer capacity in blocks
        capacity: usize,
    },
}

/// Move request errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionError {
    /// Requested feed rate is not a finite positive number
    InvalidFeedrate(f32),
    /// A target coordinate is NaN or infinite
    NonFiniteTarget {
        /// Offending axis
        axis: Axis,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Buffer(e) => write!(f, "Plan buffer error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm { axis, value } => {
                write!(f, "Invalid steps/mm on {} axis: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidFeedrate { axis, value } => {
                write!(f, "Invalid feed rate on {} axis: {}", axis, value)
            }
            ConfigError::InvalidAcceleration { axis, value } => {
                write!(f, "Invalid acceleration on {} axis: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidJerk(v) => write!(f, "Invalid max jerk: {}. Must be > 0", v),
            ConfigError::InvalidTimerFrequency(v) => {
                write!(f, "Invalid step timer frequency: {} Hz", v)
            }
            ConfigError::InvalidMinStepRate(v) => write!(f, "Invalid minimum step rate: {}", v),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Full { capacity } => {
                write!(f, "Plan buffer full ({} blocks)", capacity)
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidFeedrate(v) => {
                write!(f, "Invalid feed rate {}. Must be finite and > 0", v)
            }
            MotionError::NonFiniteTarget { axis } => {
                write!(f, "Target on {} axis is not a finite number", axis)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<BufferError> for Error {
    fn from(e: BufferError) -> Self {
        Error::Buffer(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
