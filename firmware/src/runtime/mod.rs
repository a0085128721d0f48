use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use sequencer_core::config::ControllerConfig;
use sequencer_core::control::ControlLoop;
use sequencer_core::events::EventFlags;

use crate::hw::{BoardLines, CycleDelay};
use crate::telemetry::TelemetryRecorder;
use crate::timing::SYSCLK_HZ;

mod companion_task;
mod control_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Events raised by the debouncer and the companion edge interrupts.
pub(super) static EVENT_FLAGS: EventFlags = EventFlags::new();

/// Concrete control loop type run by [`control_task`].
pub type BoardControlLoop =
    ControlLoop<'static, BoardLines<'static>, Output<'static>, CycleDelay>;

/// Runs the core from the PLL at 64 MHz; the LED bit timing depends on it.
fn clock_config() -> hal::Config {
    use hal::rcc::{Hsi, HsiSysDiv, Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

    let mut config = hal::Config::default();
    config.rcc.hsi = Some(Hsi {
        sys_div: HsiSysDiv::DIV1,
    });
    config.rcc.pll = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV1,
        mul: PllMul::MUL16,
        divp: None,
        divq: None,
        divr: Some(PllRDiv::DIV4),
    });
    config.rcc.sys = Sysclk::PLL1_R;
    config
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals {
        PA0,
        PA1,
        PA6,
        PA7,
        PA8,
        PB4,
        PB5,
        EXTI4,
        EXTI5,
        ..
    } = hal::init(clock_config());

    let lines = BoardLines::new(
        Input::new(PA0, Pull::Up),
        Output::new(PA6, Level::Low, Speed::Low),
        Output::new(PA7, Level::Low, Speed::Low),
        Output::new(PA1, Level::Low, Speed::Low),
    );
    let config = ControllerConfig::new();
    let led_pin = Output::new(PA8, Level::Low, Speed::VeryHigh);
    let led_delay = CycleDelay::new(SYSCLK_HZ, config.led_timing);

    let control = ControlLoop::new(&EVENT_FLAGS, lines, led_pin, led_delay, config)
        .expect("LED data line init");

    spawner
        .spawn(companion_task::run(
            ExtiInput::new(PB4, EXTI4, Pull::Down),
            ExtiInput::new(PB5, EXTI5, Pull::Down),
            &EVENT_FLAGS,
        ))
        .expect("failed to spawn companion task");

    spawner
        .spawn(control_task::run(control, TelemetryRecorder::new()))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
