use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use sequencer_core::events::{CompanionEdges, EventFlags};

/// Latches rising edges from the companion controller into the event flags.
///
/// Power requests arrive as ~110 ms pulses and shutdown confirmations as
/// ~120 ms pulses; only the rising edge matters.
#[embassy_executor::task]
pub async fn run(
    mut power_request: ExtiInput<'static>,
    mut shutdown_complete: ExtiInput<'static>,
    flags: &'static EventFlags,
) -> ! {
    loop {
        let edges = match select(
            power_request.wait_for_rising_edge(),
            shutdown_complete.wait_for_rising_edge(),
        )
        .await
        {
            Either::First(()) => CompanionEdges {
                power_request: true,
                shutdown_complete: false,
            },
            Either::Second(()) => CompanionEdges {
                power_request: false,
                shutdown_complete: true,
            },
        };

        defmt::debug!(
            "companion: edge power_request={} shutdown_complete={}",
            edges.power_request,
            edges.shutdown_complete
        );
        flags.latch_edges(edges);
    }
}
