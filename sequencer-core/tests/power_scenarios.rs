mod common;

use common::{SimLines, WireDelay, WirePin, wire};
use sequencer_core::clock::{Millis, MonotonicClock, TickCounter};
use sequencer_core::config::ControllerConfig;
use sequencer_core::control::{ControlAction, ControlLoop, RailState};
use sequencer_core::events::{CompanionEdges, Event, EventFlags};
use sequencer_core::led::LedColor;
use sequencer_core::lines::{Level, OutputLine};
use sequencer_core::regulator::{RAILS_OFF_PALETTE, RAILS_ON_PALETTE};

type Board<'a> = ControlLoop<'a, SimLines, WirePin, WireDelay>;

struct Harness<'a> {
    control: Board<'a>,
    clock: TickCounter,
    wire: common::SharedWire,
    raised: Vec<(Millis, Event)>,
    actions: Vec<(Millis, Option<Event>, ControlAction)>,
}

impl<'a> Harness<'a> {
    fn new(flags: &'a EventFlags) -> Self {
        Self::starting_at(flags, Millis::ZERO)
    }

    fn starting_at(flags: &'a EventFlags, start: Millis) -> Self {
        let config = ControllerConfig::default();
        let wire = wire(config.led_timing);
        let mut control = ControlLoop::new(
            flags,
            SimLines::new(),
            WirePin(wire.clone()),
            WireDelay(wire.clone()),
            config,
        )
        .expect("LED line");
        control.start().expect("start");

        Self {
            control,
            clock: TickCounter::starting_at(start),
            wire,
            raised: Vec::new(),
            actions: Vec::new(),
        }
    }

    fn run_for(&mut self, ms: u32) {
        for _ in 0..ms {
            let report = self.control.run_once(&self.clock).expect("step");
            if let Some(event) = report.raised {
                self.raised.push((report.at, event));
            }
            for record in report.records() {
                self.actions.push((report.at, record.cause, record.action));
            }
            self.clock.tick();
        }
    }

    fn press_for(&mut self, ms: u32) {
        self.control.lines_mut().button = Level::Low;
        self.run_for(ms);
        self.control.lines_mut().button = Level::High;
        self.run_for(1);
    }

    fn clear_history(&mut self) {
        self.raised.clear();
        self.actions.clear();
    }

    fn action_kinds(&self) -> Vec<ControlAction> {
        self.actions.iter().map(|(_, _, action)| *action).collect()
    }

    fn displayed_colors(&self) -> Vec<LedColor> {
        self.wire.borrow().decoder.colors().collect()
    }

    fn output(&self, line: OutputLine) -> Level {
        self.control.lines().output(line)
    }
}

fn on_colors() -> Vec<LedColor> {
    vec![RAILS_ON_PALETTE.power, RAILS_ON_PALETTE.disc, RAILS_ON_PALETTE.disc]
}

fn off_colors() -> Vec<LedColor> {
    vec![RAILS_OFF_PALETTE.power, RAILS_OFF_PALETTE.disc, RAILS_OFF_PALETTE.disc]
}

#[test]
fn startup_shows_standby_colors_with_rails_off() {
    let flags = EventFlags::new();
    let harness = Harness::new(&flags);

    assert_eq!(harness.control.rail_state(), RailState::Off);
    assert_eq!(harness.output(OutputLine::RegulatorEnable), Level::Low);
    assert_eq!(harness.output(OutputLine::FanControl), Level::Low);
    assert_eq!(harness.displayed_colors(), off_colors());
    assert_eq!(
        harness.displayed_colors(),
        vec![LedColor::from_u32(0x20_00_00), LedColor::OFF, LedColor::OFF]
    );
}

#[test]
fn short_press_from_off_enables_rails() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);
    harness.run_for(5);

    harness.press_for(15);

    assert_eq!(harness.raised.len(), 1);
    assert_eq!(harness.raised[0].1, Event::ButtonPress);
    assert_eq!(harness.action_kinds(), vec![ControlAction::RailsEnabled]);
    assert_eq!(harness.control.rail_state(), RailState::On);
    assert_eq!(harness.output(OutputLine::RegulatorEnable), Level::High);
    assert_eq!(harness.output(OutputLine::FanControl), Level::High);
    assert_eq!(harness.displayed_colors(), on_colors());
    assert_eq!(harness.control.lines().pulses_started, 0);
}

#[test]
fn press_shorter_than_threshold_does_nothing() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);

    harness.press_for(9);
    harness.run_for(50);

    assert!(harness.raised.is_empty());
    assert!(harness.actions.is_empty());
    assert_eq!(harness.control.rail_state(), RailState::Off);
}

#[test]
fn long_hold_from_off_powers_on_then_off_without_pulse() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);

    harness.press_for(2_500);

    let raised: Vec<Event> = harness.raised.iter().map(|(_, event)| *event).collect();
    assert_eq!(raised, vec![Event::ButtonPress, Event::ButtonHold]);
    assert_eq!(
        harness.action_kinds(),
        vec![ControlAction::RailsEnabled, ControlAction::RailsDisabled]
    );
    assert_eq!(harness.control.lines().pulses_started, 0);
    assert_eq!(harness.control.rail_state(), RailState::Off);
    assert_eq!(harness.displayed_colors(), off_colors());
}

#[test]
fn long_hold_while_on_pulses_companion_before_hard_cutoff() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);
    harness.press_for(15);
    harness.run_for(100);
    harness.clear_history();

    harness.press_for(2_500);

    let raised: Vec<Event> = harness.raised.iter().map(|(_, event)| *event).collect();
    assert_eq!(raised, vec![Event::ButtonPress, Event::ButtonHold]);
    assert_eq!(
        harness.action_kinds(),
        vec![
            ControlAction::ShutdownPulseSent,
            ControlAction::ShutdownPulseCompleted,
            ControlAction::RailsDisabled,
        ]
    );
    assert_eq!(harness.control.lines().pulses_started, 1);
    assert_eq!(harness.output(OutputLine::PowerPulseOut), Level::Low);
    assert_eq!(harness.control.rail_state(), RailState::Off);
}

#[test]
fn shutdown_pulse_is_exactly_thirty_milliseconds() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);
    flags.set(Event::CompanionPowerRequest);
    harness.run_for(10);
    harness.clear_history();

    harness.press_for(15);
    let sent_at = harness.actions[0].0;
    assert_eq!(harness.actions[0].2, ControlAction::ShutdownPulseSent);
    assert_eq!(harness.output(OutputLine::PowerPulseOut), Level::High);

    harness.run_for(40);
    let (completed_at, cause, action) = harness.actions[1];
    assert_eq!(action, ControlAction::ShutdownPulseCompleted);
    assert_eq!(cause, None);
    assert_eq!(completed_at.elapsed_since(sent_at), 30);
    assert_eq!(harness.output(OutputLine::PowerPulseOut), Level::Low);
    assert_eq!(harness.control.rail_state(), RailState::On);
}

#[test]
fn companion_shutdown_complete_turns_rails_off() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);
    flags.latch_edges(CompanionEdges {
        power_request: true,
        shutdown_complete: false,
    });
    harness.run_for(1);
    assert_eq!(harness.control.rail_state(), RailState::On);

    flags.latch_edges(CompanionEdges {
        power_request: false,
        shutdown_complete: true,
    });
    harness.run_for(1);

    assert!(harness.raised.is_empty());
    assert_eq!(
        harness.action_kinds(),
        vec![ControlAction::RailsEnabled, ControlAction::RailsDisabled]
    );
    assert_eq!(harness.control.rail_state(), RailState::Off);
    assert_eq!(harness.displayed_colors(), off_colors());
}

#[test]
fn every_state_change_refreshes_the_chain() {
    let flags = EventFlags::new();
    let mut harness = Harness::new(&flags);

    flags.set(Event::CompanionPowerRequest);
    harness.run_for(1);
    flags.set(Event::CompanionShutdownComplete);
    harness.run_for(1);
    flags.set(Event::CompanionPowerRequest);
    harness.run_for(1);

    // four frames on the wire; the capture counts the three that were superseded
    assert_eq!(harness.wire.borrow().frames, 3);
    assert_eq!(harness.displayed_colors(), on_colors());
}

#[test]
fn button_timing_is_unaffected_by_counter_rollover() {
    let flags = EventFlags::new();
    let mut harness = Harness::starting_at(&flags, Millis::new(u32::MAX - 1_000));

    harness.press_for(2_500);

    assert!(harness.clock.now().as_u32() < 2_000);
    let raised: Vec<(u32, Event)> = harness
        .raised
        .iter()
        .map(|(at, event)| (at.elapsed_since(Millis::new(u32::MAX - 1_000)), *event))
        .collect();
    assert_eq!(raised, vec![(10, Event::ButtonPress), (2_000, Event::ButtonHold)]);
}
