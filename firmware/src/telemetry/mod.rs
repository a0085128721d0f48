//! Telemetry ring buffer and logging helpers.
//!
//! Every action the control loop takes is kept in a fixed-capacity history
//! together with its timestamp, the rail state it left behind, and for rail
//! transitions the time since the previous one. Each record is mirrored to
//! defmt (target) or stdout (host) as it is written.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use heapless::HistoryBuf;
use sequencer_core::clock::Millis;
use sequencer_core::control::{ControlAction, RailState, StepReport};
use sequencer_core::events::Event;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Monotonic identifier assigned to each record.
pub type EventId = u32;

/// Telemetry record stored in the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Millis,
    pub cause: Option<Event>,
    pub action: ControlAction,
    pub rails: RailState,
    /// Set on rail transitions once a previous transition exists.
    pub since_last_transition_ms: Option<u32>,
}

/// Records control actions into a fixed-size ring buffer.
pub struct TelemetryRecorder {
    ring: HistoryBuf<TelemetryRecord, TELEMETRY_RING_CAPACITY>,
    last_transition_at: Option<Millis>,
    next_event_id: EventId,
}

impl TelemetryRecorder {
    /// Creates a new telemetry recorder with an empty history.
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_transition_at: None,
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    /// Records every action in `report`; `rails` is the state after the step.
    pub fn record_step(&mut self, report: &StepReport, rails: RailState) -> usize {
        for record in report.records() {
            self.record(report.at, record.cause, record.action, rails);
        }
        report.records().len()
    }

    /// Records a single action and logs it.
    pub fn record(
        &mut self,
        timestamp: Millis,
        cause: Option<Event>,
        action: ControlAction,
        rails: RailState,
    ) -> EventId {
        let is_transition = matches!(
            action,
            ControlAction::RailsEnabled | ControlAction::RailsDisabled
        );
        let since_last_transition_ms = if is_transition {
            let elapsed = self
                .last_transition_at
                .map(|previous| timestamp.elapsed_since(previous));
            self.last_transition_at = Some(timestamp);
            elapsed
        } else {
            None
        };

        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        let record = TelemetryRecord {
            id,
            timestamp,
            cause,
            action,
            rails,
            since_last_transition_ms,
        };
        self.ring.write(record);
        log_record(&record);

        id
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn log_record(record: &TelemetryRecord) {
    let cause = record.cause.map_or("timer", Event::label);
    emit_log(
        record.action.label(),
        cause,
        record.rails.label(),
        record.timestamp.as_u32(),
        record.since_last_transition_ms,
    );
}

#[cfg(target_os = "none")]
fn emit_log(action: &'static str, cause: &'static str, rails: &'static str, t_ms: u32, delta: Option<u32>) {
    if let Some(delta) = delta {
        defmt::info!(
            "telemetry:power {} cause={} {} t={}ms Δ={}ms",
            action,
            cause,
            rails,
            t_ms,
            delta
        );
    } else {
        defmt::info!(
            "telemetry:power {} cause={} {} t={}ms",
            action,
            cause,
            rails,
            t_ms
        );
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(action: &'static str, cause: &'static str, rails: &'static str, t_ms: u32, delta: Option<u32>) {
    if let Some(delta) = delta {
        println!("telemetry:power {action} cause={cause} {rails} t={t_ms}ms Δ={delta}ms");
    } else {
        println!("telemetry:power {action} cause={cause} {rails} t={t_ms}ms");
    }
}
