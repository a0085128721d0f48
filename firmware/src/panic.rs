use core::panic::PanicInfo;

// Reached on programming errors (LED index out of range, overlapping pulses
// in debug builds). Outputs keep their last level until the board is
// power-cycled.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    defmt::error!("sequencer panic: {}", defmt::Display2Format(info));
    cortex_m::asm::udf();
}
