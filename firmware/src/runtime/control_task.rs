use embassy_time::{Duration, Ticker};
use sequencer_core::clock::MonotonicClock;

use super::BoardControlLoop;
use crate::clock::EmbassyClock;
use crate::telemetry::TelemetryRecorder;

/// Loop period; well under the 10 ms press threshold.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[embassy_executor::task]
pub async fn run(mut control: BoardControlLoop, mut telemetry: TelemetryRecorder) -> ! {
    let clock = EmbassyClock;

    if let Err(err) = control.start() {
        defmt::error!("control: standby refresh failed: {}", defmt::Debug2Format(&err));
    }
    defmt::info!(
        "control: started {} t={}ms",
        control.rail_state().label(),
        clock.now().as_u32()
    );

    let mut ticker = Ticker::every(POLL_INTERVAL);
    loop {
        match control.run_once(&clock) {
            Ok(report) if !report.is_idle() => {
                telemetry.record_step(&report, control.rail_state());
            }
            Ok(_) => {}
            Err(err) => {
                defmt::error!("control: LED refresh failed: {}", defmt::Debug2Format(&err));
            }
        }
        ticker.next().await;
    }
}
