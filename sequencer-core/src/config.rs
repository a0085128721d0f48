//! Compile-time tuning shared by every component.
//!
//! The defaults are the values the front panel and the companion controller
//! expect; changing them breaks button feel or the shutdown handshake.

use crate::led::LedTiming;

/// Minimum continuous press before a `ButtonPress` is raised.
pub const PRESS_THRESHOLD_MS: u32 = 10;
/// Minimum continuous press before a `ButtonHold` is raised.
pub const HOLD_THRESHOLD_MS: u32 = 2_000;
/// Width of the soft-shutdown request pulse.
pub const PULSE_DURATION_MS: u32 = 30;

/// Dwell thresholds for the front-panel button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DebounceConfig {
    pub press_threshold_ms: u32,
    pub hold_threshold_ms: u32,
}

impl DebounceConfig {
    pub const fn new(press_threshold_ms: u32, hold_threshold_ms: u32) -> Self {
        Self {
            press_threshold_ms,
            hold_threshold_ms,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::new(PRESS_THRESHOLD_MS, HOLD_THRESHOLD_MS)
    }
}

/// Soft-shutdown pulse shape.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseConfig {
    pub duration_ms: u32,
}

impl PulseConfig {
    pub const fn new(duration_ms: u32) -> Self {
        Self { duration_ms }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self::new(PULSE_DURATION_MS)
    }
}

/// Aggregated configuration handed to [`ControlLoop`](crate::control::ControlLoop).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub debounce: DebounceConfig,
    pub pulse: PulseConfig,
    pub led_timing: LedTiming,
}

impl ControllerConfig {
    pub const fn new() -> Self {
        Self {
            debounce: DebounceConfig::new(PRESS_THRESHOLD_MS, HOLD_THRESHOLD_MS),
            pulse: PulseConfig::new(PULSE_DURATION_MS),
            led_timing: LedTiming::EVERLIGHT_19C47,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}
