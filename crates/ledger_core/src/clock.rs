//! Tick-rate accumulator.
//!
//! Converts variable host frame deltas into a whole number of allocation
//! passes. Pending time is kept in fixed point, measured in fractions of a
//! tick, so that calls adding up to `D` seconds release `floor(D * rate)`
//! ticks no matter how the time was split, to within a millionth of a tick.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_from_f64, fixed_to_f64, fixed_serde, Fixed};

/// Default tick rate (ticks per second).
pub const DEFAULT_TICK_RATE: f64 = 1.0;

/// Pending time within this much of a whole tick counts as that tick.
///
/// Absorbs the rounding of deltas such as a third of a tick, which fixed
/// point cannot represent exactly. About one millionth of a tick.
const TICK_SNAP: Fixed = Fixed::from_bits(1 << 12);

/// Largest backlog, in ticks, the accumulator can hold.
pub const MAX_PENDING_TICKS: u32 = i32::MAX.unsigned_abs();

/// Accumulates elapsed time and releases whole ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickClock {
    /// Ticks per second. Zero, negative or non-finite means one pass per call.
    rate: f64,
    /// Pending time in ticks. Below one after every `accumulate`.
    #[serde(with = "fixed_serde")]
    accumulator: Fixed,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl TickClock {
    /// Create a clock running at `rate` ticks per second.
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            accumulator: Fixed::ZERO,
        }
    }

    /// Configured ticks per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether the clock accumulates time at all.
    #[must_use]
    pub fn is_accumulating(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0
    }

    /// Change the tick rate.
    ///
    /// Pending time is preserved in seconds and re-expressed at the new rate.
    /// Switching to or from a non-accumulating rate drops it.
    pub fn set_rate(&mut self, rate: f64) {
        let pending = self.pending_seconds();
        self.rate = rate;
        self.accumulator = if self.is_accumulating() {
            fixed_from_f64(pending * rate)
        } else {
            Fixed::ZERO
        };
    }

    /// Add elapsed time and return the number of ticks now due.
    ///
    /// At a non-accumulating rate every call is worth exactly one tick.
    /// Negative or non-finite deltas add nothing.
    ///
    /// Pending time is capped at [`MAX_PENDING_TICKS`]. A delta that would
    /// push the backlog past the cap releases `MAX_PENDING_TICKS` ticks and
    /// the excess time is dropped with a warning.
    pub fn accumulate(&mut self, delta_seconds: f64) -> u32 {
        if !self.is_accumulating() {
            self.accumulator = Fixed::ZERO;
            return 1;
        }
        let mut saturated = false;
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            let ticks = delta_seconds * self.rate;
            saturated = fixed_to_f64(self.accumulator) + ticks >= f64::from(MAX_PENDING_TICKS);
            if saturated {
                tracing::warn!(
                    delta_seconds,
                    rate = self.rate,
                    max_ticks = MAX_PENDING_TICKS,
                    "Tick backlog saturated; dropping excess time"
                );
            }
            self.accumulator = self.accumulator.saturating_add(fixed_from_f64(ticks));
        } else if delta_seconds != 0.0 {
            tracing::debug!(delta_seconds, "Ignoring invalid time delta");
        }

        let due = self.accumulator.saturating_add(TICK_SNAP).floor();
        self.accumulator = if saturated {
            Fixed::ZERO
        } else {
            (self.accumulator - due).max(Fixed::ZERO)
        };
        due.to_num::<u32>()
    }

    /// Pending time not yet released as a tick, in seconds.
    #[must_use]
    pub fn pending_seconds(&self) -> f64 {
        if self.is_accumulating() {
            fixed_to_f64(self.accumulator) / self.rate
        } else {
            0.0
        }
    }

    /// Drop any pending time.
    pub fn reset(&mut self) {
        self.accumulator = Fixed::ZERO;
    }
}
