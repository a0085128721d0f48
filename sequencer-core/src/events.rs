//! Edge-triggered event flags shared between interrupt handlers and the control loop.
//!
//! Each [`Event`] owns one bit of an atomic byte. Producers OR bits in, the
//! control loop consumes them with test-and-clear semantics. A flag is binary:
//! a second occurrence before the loop drains the first one is coalesced.

use core::fmt;

use portable_atomic::{AtomicU8, Ordering};

/// Signals the control loop reacts to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    ButtonPress,
    ButtonHold,
    CompanionPowerRequest,
    CompanionShutdownComplete,
}

impl Event {
    /// Order in which the control loop services pending flags within one iteration.
    pub const DRAIN_ORDER: [Event; 4] = [
        Event::ButtonPress,
        Event::ButtonHold,
        Event::CompanionPowerRequest,
        Event::CompanionShutdownComplete,
    ];

    const fn bit(self) -> u8 {
        match self {
            Event::ButtonPress => 1 << 0,
            Event::ButtonHold => 1 << 1,
            Event::CompanionPowerRequest => 1 << 2,
            Event::CompanionShutdownComplete => 1 << 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Event::ButtonPress => "button-press",
            Event::ButtonHold => "button-hold",
            Event::CompanionPowerRequest => "companion-power-request",
            Event::CompanionShutdownComplete => "companion-shutdown-complete",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the companion controller's rising-edge interrupt flags.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CompanionEdges {
    pub power_request: bool,
    pub shutdown_complete: bool,
}

/// Set of pending [`Event`]s.
#[derive(Debug)]
pub struct EventFlags {
    bits: AtomicU8,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Marks `event` pending. Idempotent and safe to call from interrupt context.
    pub fn set(&self, event: Event) {
        self.bits.fetch_or(event.bit(), Ordering::AcqRel);
    }

    /// Clears `event` and reports whether it was pending.
    ///
    /// The read and the clear happen in one atomic operation, so a concurrent
    /// `set` for a different event is never lost.
    pub fn take(&self, event: Event) -> bool {
        let bit = event.bit();
        self.bits.fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Reports whether `event` is pending without consuming it.
    pub fn is_pending(&self, event: Event) -> bool {
        self.bits.load(Ordering::Acquire) & event.bit() != 0
    }

    /// Returns `true` when no event is pending.
    pub fn is_empty(&self) -> bool {
        self.bits.load(Ordering::Acquire) == 0
    }

    /// Drops every pending event.
    pub fn clear(&self) {
        self.bits.store(0, Ordering::Release);
    }

    /// Translates the companion edge flags read in the port interrupt into events.
    pub fn latch_edges(&self, edges: CompanionEdges) {
        if edges.power_request {
            self.set(Event::CompanionPowerRequest);
        }
        if edges.shutdown_complete {
            self.set(Event::CompanionShutdownComplete);
        }
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn take_consumes_exactly_once() {
        let flags = EventFlags::new();
        flags.set(Event::ButtonPress);

        assert!(flags.take(Event::ButtonPress));
        assert!(!flags.take(Event::ButtonPress));
        assert!(flags.is_empty());
    }

    #[test]
    fn repeated_sets_coalesce() {
        let flags = EventFlags::new();
        flags.set(Event::CompanionPowerRequest);
        flags.set(Event::CompanionPowerRequest);

        assert!(flags.take(Event::CompanionPowerRequest));
        assert!(!flags.take(Event::CompanionPowerRequest));
    }

    #[test]
    fn take_leaves_other_events_pending() {
        let flags = EventFlags::new();
        flags.set(Event::ButtonHold);
        flags.set(Event::CompanionShutdownComplete);

        assert!(flags.take(Event::ButtonHold));
        assert!(flags.is_pending(Event::CompanionShutdownComplete));
        assert!(!flags.is_pending(Event::ButtonHold));
    }

    #[test]
    fn latch_edges_maps_each_line() {
        let flags = EventFlags::new();
        flags.latch_edges(CompanionEdges {
            power_request: false,
            shutdown_complete: true,
        });

        assert!(!flags.is_pending(Event::CompanionPowerRequest));
        assert!(flags.take(Event::CompanionShutdownComplete));

        flags.latch_edges(CompanionEdges {
            power_request: true,
            shutdown_complete: true,
        });
        assert!(flags.is_pending(Event::CompanionPowerRequest));
        assert!(flags.is_pending(Event::CompanionShutdownComplete));

        flags.clear();
        assert!(flags.is_empty());
    }

    #[test]
    fn drain_order_covers_every_event_once() {
        let mut mask = 0u8;
        for event in Event::DRAIN_ORDER {
            assert_eq!(mask & event.bit(), 0);
            mask |= event.bit();
        }
        assert_eq!(mask, 0b1111);
    }

    #[test]
    fn concurrent_set_survives_take_of_other_bits() {
        use std::sync::atomic::{AtomicBool, Ordering as StdOrdering};
        use std::thread;

        const ROUNDS: usize = 20_000;

        let flags = EventFlags::new();
        let done = AtomicBool::new(false);
        let mut taken = 0;

        thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    flags.set(Event::ButtonPress);
                    while flags.is_pending(Event::ButtonPress) {
                        core::hint::spin_loop();
                    }
                }
                done.store(true, StdOrdering::Release);
            });

            loop {
                flags.set(Event::CompanionPowerRequest);
                assert!(flags.take(Event::CompanionPowerRequest));
                assert!(!flags.take(Event::CompanionShutdownComplete));
                if flags.take(Event::ButtonPress) {
                    taken += 1;
                }
                if done.load(StdOrdering::Acquire) {
                    break;
                }
            }
        });

        assert_eq!(taken, ROUNDS);
        assert!(flags.is_empty());
    }
}
