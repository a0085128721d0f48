use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt::Write as _;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use sequencer_core::clock::{MonotonicClock, TickCounter};
use sequencer_core::config::ControllerConfig;
use sequencer_core::control::{ControlLoop, StepReport};
use sequencer_core::events::{CompanionEdges, EventFlags};
use sequencer_core::led::{BitstreamDecoder, LedError, LedSlot};
use sequencer_core::lines::{InputLine, Level, LineDriver, OutputLine};

use crate::script::{Command, ParseCommandError, parse_command};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press <duration>   - hold the power button for <duration>, then release",
    ),
    ("wait", "wait <duration>    - let time pass with no stimulus"),
    (
        "request",
        "request            - companion power-request edge",
    ),
    (
        "shutdown",
        "shutdown           - companion shutdown-complete edge",
    ),
    (
        "status",
        "status             - show rails, lines, button, and LED colors",
    ),
    ("help", "help [topic]       - show help for a command"),
    ("exit", "exit | quit        - close the session"),
];

/// What the emulated LED chain last latched.
#[derive(Debug)]
struct LedWire {
    decoder: BitstreamDecoder,
    latched: bool,
    frames: usize,
}

type SharedWire = Rc<RefCell<LedWire>>;

struct WirePin(SharedWire);

impl ErrorType for WirePin {
    type Error = Infallible;
}

impl OutputPin for WirePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().decoder.record_level(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut wire = self.0.borrow_mut();
        if wire.latched {
            wire.decoder.reset();
            wire.latched = false;
        }
        wire.decoder.record_level(Level::High);
        Ok(())
    }
}

struct WireDelay(SharedWire);

impl DelayNs for WireDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut wire = self.0.borrow_mut();
        wire.decoder.record_delay(ns);
        if wire.decoder.is_latched() && !wire.latched {
            wire.latched = true;
            wire.frames += 1;
        }
    }
}

/// Board lines backed by plain fields.
#[derive(Debug)]
struct SimLines {
    button: Level,
    outputs: [Level; OutputLine::ALL.len()],
}

impl SimLines {
    fn new() -> Self {
        Self {
            button: Level::High,
            outputs: [Level::Low; OutputLine::ALL.len()],
        }
    }
}

impl LineDriver for SimLines {
    fn apply(&mut self, line: OutputLine, level: Level) {
        self.outputs[line.as_index()] = level;
    }

    fn sample(&mut self, line: InputLine) -> Level {
        match line {
            InputLine::PowerButton => self.button,
        }
    }
}

/// Result of feeding one console line to the session.
#[derive(Debug, Eq, PartialEq)]
pub enum Outcome {
    Continue(Vec<String>),
    Exit,
}

#[derive(Debug)]
pub enum SessionError {
    Parse(ParseCommandError),
    Led(LedError<Infallible>),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Parse(err) => write!(f, "{err}"),
            SessionError::Led(err) => write!(f, "LED chain: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<LedError<Infallible>> for SessionError {
    fn from(err: LedError<Infallible>) -> Self {
        SessionError::Led(err)
    }
}

/// Host-side controller: the shared control loop on simulated lines, stepped
/// once per emulated millisecond.
pub struct Session<'a> {
    control: ControlLoop<'a, SimLines, WirePin, WireDelay>,
    flags: &'a EventFlags,
    clock: TickCounter,
    wire: SharedWire,
    frames_reported: usize,
}

impl<'a> Session<'a> {
    /// Powers the emulated board up in the rails-off state.
    ///
    /// Returns the startup transcript alongside the session.
    pub fn new(flags: &'a EventFlags) -> Result<(Self, Vec<String>), SessionError> {
        let config = ControllerConfig::default();
        let wire = Rc::new(RefCell::new(LedWire {
            decoder: BitstreamDecoder::new(config.led_timing),
            latched: false,
            frames: 0,
        }));
        let control = ControlLoop::new(
            flags,
            SimLines::new(),
            WirePin(Rc::clone(&wire)),
            WireDelay(Rc::clone(&wire)),
            config,
        )?;

        let mut session = Self {
            control,
            flags,
            clock: TickCounter::new(),
            wire,
            frames_reported: 0,
        };
        session.control.start()?;

        let mut transcript = Vec::new();
        session.drain_frames(&mut transcript);
        Ok((session, transcript))
    }

    pub fn now_ms(&self) -> u32 {
        self.clock.now().as_u32()
    }

    pub fn handle_command(&mut self, input: &str) -> Result<Outcome, SessionError> {
        let command = parse_command(input).map_err(SessionError::Parse)?;
        let mut out = Vec::new();

        match command {
            Command::Press { ms } => {
                self.control.lines_mut().button = Level::Low;
                self.advance(ms, &mut out)?;
                self.control.lines_mut().button = Level::High;
                self.advance(1, &mut out)?;
            }
            Command::Wait { ms } => self.advance(ms, &mut out)?,
            Command::Request => {
                self.flags.latch_edges(CompanionEdges {
                    power_request: true,
                    shutdown_complete: false,
                });
                self.advance(1, &mut out)?;
            }
            Command::Shutdown => {
                self.flags.latch_edges(CompanionEdges {
                    power_request: false,
                    shutdown_complete: true,
                });
                self.advance(1, &mut out)?;
            }
            Command::Status => self.status(&mut out),
            Command::Help(topic) => help(topic, &mut out),
            Command::Exit => return Ok(Outcome::Exit),
        }

        Ok(Outcome::Continue(out))
    }

    fn advance(&mut self, ms: u32, out: &mut Vec<String>) -> Result<(), SessionError> {
        for _ in 0..ms {
            self.clock.tick();
            let report = self.control.run_once(&self.clock)?;
            log_report(&report, out);
            self.drain_frames(out);
        }
        Ok(())
    }

    fn drain_frames(&mut self, out: &mut Vec<String>) {
        let wire = self.wire.borrow();
        if wire.frames == self.frames_reported {
            return;
        }
        self.frames_reported = wire.frames;

        let mut line = format!("[{:>7}ms] leds", self.clock.now().as_u32());
        for (slot, color) in LedSlot::ALL.iter().zip(wire.decoder.colors()) {
            let _ = write!(line, " {}={color}", slot.name());
        }
        out.push(line);
    }

    fn status(&self, out: &mut Vec<String>) {
        let lines = self.control.lines();
        out.push(format!(
            "t={}ms rails={} button={:?} pulse={}",
            self.clock.now().as_u32(),
            self.control.rail_state(),
            self.control.debouncer().state(),
            if self.control.pulse().is_active() {
                "active"
            } else {
                "idle"
            },
        ));

        let mut outputs = String::from("outputs");
        for line in OutputLine::ALL {
            let level = if lines.outputs[line.as_index()].is_high() {
                "high"
            } else {
                "low"
            };
            let _ = write!(outputs, " {}={level}", line.name());
        }
        out.push(outputs);

        let mut leds = String::from("leds");
        let buffer = self.control.regulator().leds().buffer();
        for (slot, color) in LedSlot::ALL.iter().zip(buffer.as_slice()) {
            let _ = write!(leds, " {}={color}", slot.name());
        }
        out.push(leds);
    }
}

fn log_report(report: &StepReport, out: &mut Vec<String>) {
    let at = report.at.as_u32();
    if let Some(event) = report.raised {
        out.push(format!("[{at:>7}ms] event {event}"));
    }
    for record in report.records() {
        match record.cause {
            Some(cause) => out.push(format!("[{at:>7}ms] {cause} -> {}", record.action)),
            None => out.push(format!("[{at:>7}ms] timer -> {}", record.action)),
        }
    }
}

fn help(topic: Option<&str>, out: &mut Vec<String>) {
    match topic {
        None => out.extend(HELP_TOPICS.iter().map(|(_, text)| (*text).to_string())),
        Some(topic) => match HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
        {
            Some((_, text)) => out.push((*text).to_string()),
            None => out.push(format!("no help for `{topic}`")),
        },
    }
}
