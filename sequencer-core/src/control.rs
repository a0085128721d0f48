//! Cooperative control loop that arbitrates power requests.
//!
//! Each call to [`ControlLoop::step`] samples the button, retires a finished
//! shutdown pulse, and then drains every pending [`Event`] in
//! [`Event::DRAIN_ORDER`], so flags raised within the same tick are all
//! serviced before the next one.
//!
//! | event                              | rails off     | rails on                    |
//! |------------------------------------|---------------|-----------------------------|
//! | `ButtonPress`, `CompanionPowerRequest` | enable rails | send soft-shutdown pulse |
//! | `ButtonHold`, `CompanionShutdownComplete` | discard  | disable rails               |

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::button::ButtonDebouncer;
use crate::clock::{Millis, MonotonicClock};
use crate::config::ControllerConfig;
use crate::events::{Event, EventFlags};
use crate::led::{LedError, LedStripEncoder};
use crate::lines::{InputLine, LineDriver};
use crate::pulse::PowerPulseGenerator;
use crate::regulator::RegulatorStateCoordinator;

/// Whether the main rails are powered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RailState {
    Off,
    On,
}

impl RailState {
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { RailState::On } else { RailState::Off }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RailState::Off => "rails-off",
            RailState::On => "rails-on",
        }
    }
}

impl fmt::Display for RailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the loop did in response to a cause.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlAction {
    RailsEnabled,
    RailsDisabled,
    ShutdownPulseSent,
    ShutdownPulseCompleted,
    /// The event had no effect in the current state.
    Discarded,
}

impl ControlAction {
    pub const fn label(self) -> &'static str {
        match self {
            ControlAction::RailsEnabled => "rails-enabled",
            ControlAction::RailsDisabled => "rails-disabled",
            ControlAction::ShutdownPulseSent => "shutdown-pulse-sent",
            ControlAction::ShutdownPulseCompleted => "shutdown-pulse-completed",
            ControlAction::Discarded => "discarded",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One action together with the event that caused it (`None` for timer-driven actions).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControlRecord {
    pub cause: Option<Event>,
    pub action: ControlAction,
}

/// Upper bound on records per step: one pulse completion plus one per event kind.
pub const MAX_STEP_RECORDS: usize = Event::DRAIN_ORDER.len() + 1;

/// Everything a single [`ControlLoop::step`] observed and did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepReport {
    pub at: Millis,
    /// Event raised by the debouncer during this step, if any.
    pub raised: Option<Event>,
    records: Vec<ControlRecord, MAX_STEP_RECORDS>,
}

impl StepReport {
    const fn new(at: Millis) -> Self {
        Self {
            at,
            raised: None,
            records: Vec::new(),
        }
    }

    fn push(&mut self, cause: Option<Event>, action: ControlAction) {
        let pushed = self.records.push(ControlRecord { cause, action });
        debug_assert!(pushed.is_ok(), "step produced more than MAX_STEP_RECORDS records");
    }

    pub fn records(&self) -> &[ControlRecord] {
        &self.records
    }

    /// Returns `true` when the step neither raised nor serviced anything.
    pub fn is_idle(&self) -> bool {
        self.raised.is_none() && self.records.is_empty()
    }

    /// Returns `true` when any record carries `action`.
    pub fn contains(&self, action: ControlAction) -> bool {
        self.records.iter().any(|record| record.action == action)
    }
}

/// The power-state machine plus the components it drives.
pub struct ControlLoop<'a, L, P, D> {
    flags: &'a EventFlags,
    lines: L,
    debouncer: ButtonDebouncer,
    pulse: PowerPulseGenerator,
    regulator: RegulatorStateCoordinator<P, D>,
}

impl<'a, L, P, D> ControlLoop<'a, L, P, D>
where
    L: LineDriver,
    P: OutputPin,
    D: DelayNs,
{
    /// Builds the loop around the board lines and the LED data line.
    ///
    /// Nothing is driven besides parking the LED line low; call [`Self::start`]
    /// to apply the power-on defaults.
    pub fn new(
        flags: &'a EventFlags,
        lines: L,
        led_pin: P,
        led_delay: D,
        config: ControllerConfig,
    ) -> Result<Self, LedError<P::Error>> {
        let leds = LedStripEncoder::new(led_pin, led_delay, config.led_timing)?;
        Ok(Self {
            flags,
            lines,
            debouncer: ButtonDebouncer::new(config.debounce),
            pulse: PowerPulseGenerator::new(config.pulse),
            regulator: RegulatorStateCoordinator::new(leds),
        })
    }

    /// Drops edges latched during boot and switches the rails off with the
    /// standby colors shown.
    pub fn start(&mut self) -> Result<(), LedError<P::Error>> {
        self.flags.clear();
        self.regulator.set_state(&mut self.lines, false)
    }

    pub const fn rail_state(&self) -> RailState {
        RailState::from_enabled(self.regulator.is_enabled())
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn debouncer(&self) -> &ButtonDebouncer {
        &self.debouncer
    }

    pub fn pulse(&self) -> &PowerPulseGenerator {
        &self.pulse
    }

    pub fn regulator(&self) -> &RegulatorStateCoordinator<P, D> {
        &self.regulator
    }

    /// Runs one iteration using the clock's current time.
    pub fn run_once<C: MonotonicClock>(
        &mut self,
        clock: &C,
    ) -> Result<StepReport, LedError<P::Error>> {
        self.step(clock.now())
    }

    /// Runs one iteration at `now`.
    pub fn step(&mut self, now: Millis) -> Result<StepReport, LedError<P::Error>> {
        let mut report = StepReport::new(now);

        let level = self.lines.sample(InputLine::PowerButton);
        report.raised = self.debouncer.poll(level, now, self.flags);

        if self.pulse.poll_complete(&mut self.lines, now) {
            report.push(None, ControlAction::ShutdownPulseCompleted);
        }

        for event in Event::DRAIN_ORDER {
            if self.flags.take(event) {
                let action = self.dispatch(event, now)?;
                report.push(Some(event), action);
            }
        }

        Ok(report)
    }

    fn dispatch(&mut self, event: Event, now: Millis) -> Result<ControlAction, LedError<P::Error>> {
        let action = match (event, self.rail_state()) {
            (Event::ButtonPress | Event::CompanionPowerRequest, RailState::Off) => {
                self.regulator.set_state(&mut self.lines, true)?;
                ControlAction::RailsEnabled
            }
            (Event::ButtonPress | Event::CompanionPowerRequest, RailState::On) => {
                // A request inside the pulse window joins the pulse already on the wire.
                if self.pulse.is_active() {
                    ControlAction::Discarded
                } else {
                    self.pulse.send_pulse(&mut self.lines, now);
                    ControlAction::ShutdownPulseSent
                }
            }
            (Event::ButtonHold | Event::CompanionShutdownComplete, RailState::On) => {
                self.regulator.set_state(&mut self.lines, false)?;
                ControlAction::RailsDisabled
            }
            (Event::ButtonHold | Event::CompanionShutdownComplete, RailState::Off) => {
                ControlAction::Discarded
            }
        };
        Ok(action)
    }
}
