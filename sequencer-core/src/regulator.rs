//! Main power rails, fan, and the status colors that mirror them.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::led::{LedColor, LedError, LedSlot, LedStripEncoder};
use crate::lines::{Level, LineDriver, OutputLine};

/// Colors shown for one rail state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Palette {
    pub power: LedColor,
    pub disc: LedColor,
}

impl Palette {
    /// Color for `slot` under this palette.
    pub const fn color_for(&self, slot: LedSlot) -> LedColor {
        match slot {
            LedSlot::Power => self.power,
            LedSlot::DiscLeft | LedSlot::DiscRight => self.disc,
        }
    }
}

/// Green power LED, cyan disc LEDs.
pub const RAILS_ON_PALETTE: Palette = Palette {
    power: LedColor::from_u32(0x00_20_00),
    disc: LedColor::from_u32(0x00_FF_FF),
};

/// Dim red power LED, disc LEDs dark.
pub const RAILS_OFF_PALETTE: Palette = Palette {
    power: LedColor::from_u32(0x20_00_00),
    disc: LedColor::OFF,
};

/// Palette matching a rail state.
pub const fn palette_for(enabled: bool) -> Palette {
    if enabled {
        RAILS_ON_PALETTE
    } else {
        RAILS_OFF_PALETTE
    }
}

/// Owns the LED chain and keeps rails, fan, and colors in step.
pub struct RegulatorStateCoordinator<P, D> {
    leds: LedStripEncoder<P, D>,
    enabled: bool,
}

impl<P, D> RegulatorStateCoordinator<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Wraps the LED encoder. Rails are assumed off until [`Self::set_state`] runs.
    pub fn new(leds: LedStripEncoder<P, D>) -> Self {
        Self {
            leds,
            enabled: false,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn leds(&self) -> &LedStripEncoder<P, D> {
        &self.leds
    }

    /// Switches rails and fan, repaints the chain, and refreshes it.
    ///
    /// The refresh always happens, even when `enabled` matches the current state.
    /// The rail state is recorded before the refresh so it tracks the outputs
    /// even when the LED line fails.
    pub fn set_state<L: LineDriver>(
        &mut self,
        lines: &mut L,
        enabled: bool,
    ) -> Result<(), LedError<P::Error>> {
        let level = Level::from_high(enabled);
        lines.apply(OutputLine::RegulatorEnable, level);
        lines.apply(OutputLine::FanControl, level);
        self.enabled = enabled;

        let palette = palette_for(enabled);
        for slot in LedSlot::ALL {
            self.leds.set_slot(slot, palette.color_for(slot));
        }
        self.leds.refresh()
    }

    pub fn release(self) -> LedStripEncoder<P, D> {
        self.leds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::{LED_COUNT, LedTiming};
    use crate::lines::InputLine;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct RailLines {
        levels: [Option<Level>; 3],
    }

    impl LineDriver for RailLines {
        fn apply(&mut self, line: OutputLine, level: Level) {
            self.levels[line.as_index()] = Some(level);
        }

        fn sample(&mut self, _: InputLine) -> Level {
            Level::High
        }
    }

    #[derive(Default)]
    struct FramePin {
        frames_bits: usize,
    }

    impl ErrorType for FramePin {
        type Error = Infallible;
    }

    impl OutputPin for FramePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.frames_bits += 1;
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    fn coordinator() -> RegulatorStateCoordinator<FramePin, NoDelay> {
        let leds =
            LedStripEncoder::new(FramePin::default(), NoDelay, LedTiming::default()).unwrap();
        RegulatorStateCoordinator::new(leds)
    }

    fn colors(coordinator: &RegulatorStateCoordinator<FramePin, NoDelay>) -> [LedColor; LED_COUNT] {
        let buffer = coordinator.leds().buffer();
        [
            buffer.get(0).unwrap(),
            buffer.get(1).unwrap(),
            buffer.get(2).unwrap(),
        ]
    }

    #[test]
    fn enabling_drives_rails_and_paints_green_cyan() {
        let mut lines = RailLines::default();
        let mut coordinator = coordinator();

        coordinator.set_state(&mut lines, true).unwrap();

        assert!(coordinator.is_enabled());
        assert_eq!(lines.levels[0], Some(Level::High));
        assert_eq!(lines.levels[1], Some(Level::High));
        assert_eq!(lines.levels[2], None);
        assert_eq!(
            colors(&coordinator),
            [
                LedColor::from_u32(0x00_20_00),
                LedColor::from_u32(0x00_FF_FF),
                LedColor::from_u32(0x00_FF_FF),
            ]
        );
    }

    #[test]
    fn disabling_drops_rails_and_paints_dim_red() {
        let mut lines = RailLines::default();
        let mut coordinator = coordinator();

        coordinator.set_state(&mut lines, true).unwrap();
        coordinator.set_state(&mut lines, false).unwrap();

        assert!(!coordinator.is_enabled());
        assert_eq!(lines.levels[0], Some(Level::Low));
        assert_eq!(lines.levels[1], Some(Level::Low));
        assert_eq!(
            colors(&coordinator),
            [LedColor::from_u32(0x20_00_00), LedColor::OFF, LedColor::OFF]
        );
    }

    #[test]
    fn repeated_state_still_refreshes() {
        let mut lines = RailLines::default();
        let mut coordinator = coordinator();

        coordinator.set_state(&mut lines, false).unwrap();
        coordinator.set_state(&mut lines, false).unwrap();

        let (pin, _) = coordinator.release().release();
        assert_eq!(pin.frames_bits, 2 * LED_COUNT * 24);
    }
}
