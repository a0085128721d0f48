#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use sequencer_core::led::{BitstreamDecoder, LedTiming};
use sequencer_core::lines::{InputLine, Level, LineDriver, OutputLine};

/// Level change or delay observed on the LED data line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WireEvent {
    Level(Level),
    Delay(u32),
}

/// Shared capture of everything the encoder did to the data line.
#[derive(Debug)]
pub struct WireCapture {
    pub decoder: BitstreamDecoder,
    pub trace: Vec<WireEvent>,
    pub frames: usize,
}

pub type SharedWire = Rc<RefCell<WireCapture>>;

pub fn wire(timing: LedTiming) -> SharedWire {
    Rc::new(RefCell::new(WireCapture {
        decoder: BitstreamDecoder::new(timing),
        trace: Vec::new(),
        frames: 0,
    }))
}

pub struct WirePin(pub SharedWire);

impl ErrorType for WirePin {
    type Error = Infallible;
}

impl OutputPin for WirePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut wire = self.0.borrow_mut();
        wire.decoder.record_level(Level::Low);
        wire.trace.push(WireEvent::Level(Level::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut wire = self.0.borrow_mut();
        if wire.decoder.is_latched() {
            wire.decoder.reset();
            wire.frames += 1;
        }
        wire.decoder.record_level(Level::High);
        wire.trace.push(WireEvent::Level(Level::High));
        Ok(())
    }
}

pub struct WireDelay(pub SharedWire);

impl DelayNs for WireDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut wire = self.0.borrow_mut();
        wire.decoder.record_delay(ns);
        wire.trace.push(WireEvent::Delay(ns));
    }
}

/// Board lines with a controllable button and recorded outputs.
#[derive(Debug)]
pub struct SimLines {
    pub button: Level,
    pub outputs: [Level; 3],
    pub pulses_started: usize,
}

impl SimLines {
    pub fn new() -> Self {
        Self {
            button: Level::High,
            outputs: [Level::Low; 3],
            pulses_started: 0,
        }
    }

    pub fn output(&self, line: OutputLine) -> Level {
        self.outputs[line.as_index()]
    }
}

impl LineDriver for SimLines {
    fn apply(&mut self, line: OutputLine, level: Level) {
        if line == OutputLine::PowerPulseOut && level.is_high() {
            self.pulses_started += 1;
        }
        self.outputs[line.as_index()] = level;
    }

    fn sample(&mut self, line: InputLine) -> Level {
        match line {
            InputLine::PowerButton => self.button,
        }
    }
}
