//! Soft-shutdown request pulse towards the companion controller.

use crate::clock::Millis;
use crate::config::PulseConfig;
use crate::lines::{Level, LineDriver, OutputLine};

/// State of the outstanding pulse, if any.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PulseRequest {
    pub active: bool,
    pub start_time: Millis,
}

/// Drives [`OutputLine::PowerPulseOut`] high for a fixed duration.
#[derive(Clone, Debug)]
pub struct PowerPulseGenerator {
    config: PulseConfig,
    request: PulseRequest,
}

impl PowerPulseGenerator {
    pub const fn new(config: PulseConfig) -> Self {
        Self {
            config,
            request: PulseRequest {
                active: false,
                start_time: Millis::ZERO,
            },
        }
    }

    pub const fn is_active(&self) -> bool {
        self.request.active
    }

    pub const fn request(&self) -> PulseRequest {
        self.request
    }

    /// Raises the pulse line and starts timing it.
    ///
    /// The caller must not start a pulse while another one is active.
    pub fn send_pulse<L: LineDriver>(&mut self, lines: &mut L, now: Millis) {
        debug_assert!(!self.request.active, "power pulse already in flight");
        lines.apply(OutputLine::PowerPulseOut, Level::High);
        self.request = PulseRequest {
            active: true,
            start_time: now,
        };
    }

    /// Lowers the pulse line once the configured width has elapsed.
    ///
    /// Returns `true` on the call that ends the pulse.
    pub fn poll_complete<L: LineDriver>(&mut self, lines: &mut L, now: Millis) -> bool {
        if self.request.active && now.has_elapsed(self.request.start_time, self.config.duration_ms)
        {
            lines.apply(OutputLine::PowerPulseOut, Level::Low);
            self.request.active = false;
            return true;
        }
        false
    }
}

impl Default for PowerPulseGenerator {
    fn default() -> Self {
        Self::new(PulseConfig::default())
    }
}
