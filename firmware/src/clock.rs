//! Millisecond clock backed by the embassy time driver.
//!
//! The time driver keeps a 64-bit tick count; the control loop only needs the
//! low 32 bits of the millisecond value, which wrap exactly like a free-running
//! 32-bit millisecond counter.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use embassy_time::Instant;
use sequencer_core::clock::Millis;

/// Truncates an embassy instant to a wrapping millisecond timestamp.
#[allow(clippy::cast_possible_truncation)]
pub fn millis_from_instant(instant: Instant) -> Millis {
    Millis::new(instant.as_millis() as u32)
}

#[cfg(target_os = "none")]
pub use target::EmbassyClock;

#[cfg(target_os = "none")]
mod target {
    use embassy_time::Instant;
    use sequencer_core::clock::{Millis, MonotonicClock};

    use super::millis_from_instant;

    /// [`MonotonicClock`] reading `embassy_time::Instant::now`.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct EmbassyClock;

    impl MonotonicClock for EmbassyClock {
        fn now(&self) -> Millis {
            millis_from_instant(Instant::now())
        }
    }
}
