#![no_std]

// Power sequencing logic for the front-panel controller.
//
// Portable across MCU firmware and host tooling: no standard library, and the
// lines, LED data pin, and clock are injected by the caller.

pub mod button;
pub mod clock;
pub mod config;
pub mod control;
pub mod events;
pub mod led;
pub mod lines;
pub mod pulse;
pub mod regulator;
