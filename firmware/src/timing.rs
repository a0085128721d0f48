//! Nanosecond-to-cycle conversion for the LED bit-banging delay.
//!
//! The four bit widths are converted once up front so the per-bit path is a
//! compare and a table read; only other durations (the latch) pay for the
//! division.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use sequencer_core::led::LedTiming;

/// Core clock after the PLL is configured in `runtime`.
pub const SYSCLK_HZ: u32 = 64_000_000;

/// Cycles spent toggling the pin and entering the delay loop.
pub const CALL_OVERHEAD_CYCLES: u32 = 6;

/// Precomputed busy-wait lengths for one [`LedTiming`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CycleBudget {
    cycles_per_us: u32,
    widths: [(u32, u32); 4],
}

impl CycleBudget {
    pub const fn new(sysclk_hz: u32, timing: LedTiming) -> Self {
        let cycles_per_us = sysclk_hz / 1_000_000;
        Self {
            cycles_per_us,
            widths: [
                (timing.t0h_ns, trimmed(ns_to_cycles(timing.t0h_ns, cycles_per_us))),
                (timing.t0l_ns, trimmed(ns_to_cycles(timing.t0l_ns, cycles_per_us))),
                (timing.t1h_ns, trimmed(ns_to_cycles(timing.t1h_ns, cycles_per_us))),
                (timing.t1l_ns, trimmed(ns_to_cycles(timing.t1l_ns, cycles_per_us))),
            ],
        }
    }

    /// Busy-wait cycles for `ns`, net of call overhead.
    pub fn cycles_for(&self, ns: u32) -> u32 {
        for (width_ns, cycles) in self.widths {
            if width_ns == ns {
                return cycles;
            }
        }
        trimmed(ns_to_cycles(ns, self.cycles_per_us))
    }
}

/// Rounds to the nearest whole cycle.
const fn ns_to_cycles(ns: u32, cycles_per_us: u32) -> u32 {
    let whole = (ns / 1_000) * cycles_per_us;
    let fraction = ((ns % 1_000) * cycles_per_us + 500) / 1_000;
    whole + fraction
}

const fn trimmed(cycles: u32) -> u32 {
    cycles.saturating_sub(CALL_OVERHEAD_CYCLES)
}
