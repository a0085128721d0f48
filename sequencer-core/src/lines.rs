//! Named digital lines and the driver capability that toggles them.

/// Logic level of a digital line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn from_high(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

/// Push-pull outputs owned by the control loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputLine {
    /// Enables the main power rails (active high).
    RegulatorEnable,
    /// Enables the cooling fan (active high).
    FanControl,
    /// Soft-shutdown request to the companion controller (active high, pulsed).
    PowerPulseOut,
}

impl OutputLine {
    pub const ALL: [OutputLine; 3] = [
        OutputLine::RegulatorEnable,
        OutputLine::FanControl,
        OutputLine::PowerPulseOut,
    ];

    pub const fn as_index(self) -> usize {
        match self {
            OutputLine::RegulatorEnable => 0,
            OutputLine::FanControl => 1,
            OutputLine::PowerPulseOut => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            OutputLine::RegulatorEnable => "REG_EN",
            OutputLine::FanControl => "FAN",
            OutputLine::PowerPulseOut => "POWER",
        }
    }
}

/// Polled inputs. The companion lines are edge-triggered and arrive through
/// [`EventFlags`](crate::events::EventFlags) instead.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputLine {
    /// Front-panel button, pulled up, low while pressed.
    PowerButton,
}

/// Abstraction over the board's GPIO lines.
pub trait LineDriver {
    /// Drives `line` to `level`.
    fn apply(&mut self, line: OutputLine, level: Level);

    /// Reads the current level of `line`.
    fn sample(&mut self, line: InputLine) -> Level;
}

/// Line driver that performs no hardware interaction and reads every input idle.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLineDriver;

impl NoopLineDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl LineDriver for NoopLineDriver {
    fn apply(&mut self, _: OutputLine, _: Level) {}

    fn sample(&mut self, _: InputLine) -> Level {
        Level::High
    }
}
