//! Step rate to timer period conversion.
//!
//! The step interrupt reprograms its own period after every event. Dividing
//! the timer frequency by the rate there is too slow on small cores, so the
//! periods are precomputed once and interpolated linearly.

use crate::config::TimerConfig;

/// Fastest step rate the engine will program (steps/s).
pub const MAX_STEP_RATE: u32 = 65_535;

const FAST_SHIFT: u32 = 8;
const FAST_ENTRIES: usize = (MAX_STEP_RATE >> FAST_SHIFT) as usize + 2;
const SLOW_SHIFT: u32 = 3;
const SLOW_LIMIT: u32 = 1 << 11;
const SLOW_ENTRIES: usize = (SLOW_LIMIT >> SLOW_SHIFT) as usize + 1;

/// Precomputed rate-to-period lookup.
///
/// Rates below 2048 steps/s use a finer table, where `1/rate` curves most.
#[derive(Debug, Clone)]
pub struct RateTable {
    fast: [u32; FAST_ENTRIES],
    slow: [u32; SLOW_ENTRIES],
    min_rate: u32,
    frequency_hz: u32,
}

impl RateTable {
    /// Build the table for a timer.
    pub fn new(config: &TimerConfig) -> Self {
        let frequency_hz = config.frequency_hz;
        let min_rate = config.min_step_rate.clamp(1, MAX_STEP_RATE);
        let period = |rate: u32| frequency_hz / rate.max(min_rate);

        Self {
            fast: core::array::from_fn(|i| period((i as u32) << FAST_SHIFT)),
            slow: core::array::from_fn(|i| period((i as u32) << SLOW_SHIFT)),
            min_rate,
            frequency_hz,
        }
    }

    /// Timer period, in timer ticks, for a step rate.
    ///
    /// Rates are clamped to `[min_step_rate, MAX_STEP_RATE]`. The result is
    /// non-increasing in `rate`.
    pub fn period(&self, rate: u32) -> u32 {
        let rate = rate.clamp(self.min_rate, MAX_STEP_RATE);
        let (table, shift) = if rate < SLOW_LIMIT {
            (&self.slow[..], SLOW_SHIFT)
        } else {
            (&self.fast[..], FAST_SHIFT)
        };

        let idx = (rate >> shift) as usize;
        let frac = (rate & ((1 << shift) - 1)) as u64;
        let hi = table[idx];
        let lo = table[idx + 1];
        hi - (((hi - lo) as u64 * frac) >> shift) as u32
    }

    /// Lowest rate the table will program.
    #[inline]
    pub fn min_rate(&self) -> u32 {
        self.min_rate
    }

    /// Timer frequency in Hz.
    #[inline]
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }
}

/// Rate gained per timer tick in 8.24 fixed point.
///
/// `rate(t) = initial + (t * acceleration_rate) >> 24`, with `t` in timer
/// ticks.
pub fn acceleration_rate(acceleration_st: f32, frequency_hz: u32) -> u32 {
    if !(acceleration_st > 0.0) || frequency_hz == 0 {
        return 0;
    }
    let scaled = ((acceleration_st as u64) << 24) / frequency_hz as u64;
    scaled.min(u32::MAX as u64) as u32
}
