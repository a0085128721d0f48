//! Millisecond timestamps and the monotonic clock capability.
//!
//! The counter is 32 bits wide and wraps after roughly 49.7 days. Every
//! elapsed-time comparison in the crate goes through [`Millis::elapsed_since`],
//! which subtracts modulo 2^32 so a rollover between two samples still yields
//! the true distance between them.

use core::fmt;

use portable_atomic::{AtomicU32, Ordering};

/// Wraparound-safe millisecond timestamp.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Millis(u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, modulo 2^32.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns `true` once at least `threshold_ms` have passed since `since`.
    #[must_use]
    pub const fn has_elapsed(self, since: Millis, threshold_ms: u32) -> bool {
        self.elapsed_since(since) >= threshold_ms
    }

    #[must_use]
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of the ever-incrementing millisecond counter.
pub trait MonotonicClock {
    fn now(&self) -> Millis;
}

/// Millisecond counter advanced from a periodic timer interrupt.
///
/// `tick` is a single atomic add, so it is safe to call from interrupt context
/// while the main loop reads [`MonotonicClock::now`].
#[derive(Debug)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self::starting_at(Millis::ZERO)
    }

    /// Creates a counter preloaded with `start`, mostly useful for exercising rollover.
    pub const fn starting_at(start: Millis) -> Self {
        Self {
            ticks: AtomicU32::new(start.as_u32()),
        }
    }

    /// Advances the counter by one millisecond, wrapping at `u32::MAX`.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Release);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for TickCounter {
    fn now(&self) -> Millis {
        Millis(self.ticks.load(Ordering::Acquire))
    }
}
