//! Board bindings for the STM32G0 front-panel controller.
//!
//! | line                        | pin  | notes                         |
//! |-----------------------------|------|-------------------------------|
//! | PowerButton                 | PA0  | input, pull-up, low = pressed |
//! | PowerPulseOut               | PA1  | push-pull, idle low           |
//! | RegulatorEnable             | PA6  | push-pull, idle low           |
//! | FanControl                  | PA7  | push-pull, idle low           |
//! | LedData                     | PA8  | push-pull, very high speed    |
//! | CompanionPowerRequest       | PB4  | EXTI4, rising edge            |
//! | CompanionShutdownComplete   | PB5  | EXTI5, rising edge            |

use embassy_stm32::gpio::{Input, Level as PinLevel, Output};
use embedded_hal::delay::DelayNs;
use sequencer_core::led::LedTiming;
use sequencer_core::lines::{InputLine, Level, LineDriver, OutputLine};

use crate::timing::CycleBudget;

/// GPIO lines driven through [`LineDriver`].
pub struct BoardLines<'d> {
    button: Input<'d>,
    regulator: Output<'d>,
    fan: Output<'d>,
    pulse: Output<'d>,
}

impl<'d> BoardLines<'d> {
    pub fn new(button: Input<'d>, regulator: Output<'d>, fan: Output<'d>, pulse: Output<'d>) -> Self {
        Self {
            button,
            regulator,
            fan,
            pulse,
        }
    }

    fn output_mut(&mut self, line: OutputLine) -> &mut Output<'d> {
        match line {
            OutputLine::RegulatorEnable => &mut self.regulator,
            OutputLine::FanControl => &mut self.fan,
            OutputLine::PowerPulseOut => &mut self.pulse,
        }
    }
}

impl<'d> LineDriver for BoardLines<'d> {
    fn apply(&mut self, line: OutputLine, level: Level) {
        let level = match level {
            Level::Low => PinLevel::Low,
            Level::High => PinLevel::High,
        };
        self.output_mut(line).set_level(level);
    }

    fn sample(&mut self, line: InputLine) -> Level {
        match line {
            InputLine::PowerButton => Level::from_high(self.button.is_high()),
        }
    }
}

/// Busy-wait delay counted in core cycles.
pub struct CycleDelay {
    budget: CycleBudget,
}

impl CycleDelay {
    pub const fn new(sysclk_hz: u32, timing: LedTiming) -> Self {
        Self {
            budget: CycleBudget::new(sysclk_hz, timing),
        }
    }
}

impl DelayNs for CycleDelay {
    #[inline(always)]
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.budget.cycles_for(ns);
        if cycles > 0 {
            cortex_m::asm::delay(cycles);
        }
    }
}
