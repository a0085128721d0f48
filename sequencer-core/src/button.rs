//! Front-panel button debouncing.
//!
//! The button is sampled on every loop iteration. Any level change restarts
//! the dwell timer and drops the state back to [`ButtonState::Released`];
//! while the line stays low the state only moves forward, raising one event
//! per threshold crossed.

use crate::clock::Millis;
use crate::config::DebounceConfig;
use crate::events::{Event, EventFlags};
use crate::lines::Level;

/// Progress of the current press. Ordered so a press can only advance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum ButtonState {
    Released,
    Pressed,
    Held,
}

/// Polled debouncer for an active-low button.
#[derive(Clone, Debug)]
pub struct ButtonDebouncer {
    config: DebounceConfig,
    last_level: Level,
    last_transition: Millis,
    state: ButtonState,
}

impl ButtonDebouncer {
    /// Creates a debouncer that assumes the line starts released (pulled high).
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            last_level: Level::High,
            last_transition: Millis::ZERO,
            state: ButtonState::Released,
        }
    }

    pub const fn state(&self) -> ButtonState {
        self.state
    }

    pub const fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Feeds one sample and returns the event raised by it, if any.
    ///
    /// At most one event is returned per call: when a single sample already
    /// satisfies both thresholds, `ButtonPress` comes first and `ButtonHold`
    /// follows on the next call.
    pub fn update(&mut self, level: Level, now: Millis) -> Option<Event> {
        if level != self.last_level {
            self.last_level = level;
            self.last_transition = now;
            self.state = ButtonState::Released;
        }

        if level.is_high() {
            return None;
        }

        let held_for = now.elapsed_since(self.last_transition);
        if held_for >= self.config.press_threshold_ms && self.state < ButtonState::Pressed {
            self.state = ButtonState::Pressed;
            Some(Event::ButtonPress)
        } else if held_for >= self.config.hold_threshold_ms && self.state < ButtonState::Held {
            self.state = ButtonState::Held;
            Some(Event::ButtonHold)
        } else {
            None
        }
    }

    /// Samples the button and publishes any raised event into `flags`.
    pub fn poll(&mut self, level: Level, now: Millis, flags: &EventFlags) -> Option<Event> {
        let event = self.update(level, now);
        if let Some(event) = event {
            flags.set(event);
        }
        event
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}
