use serde::{Deserialize, Serialize};

use crate::control::NoteFilter;
use crate::events::MidiEvent;

/// The decoded, tick-ordered event sequence for one MIDI track.
///
/// Built once at import time and never mutated afterwards, so it can be
/// shared read-only (e.g. behind an `Arc`) by any number of concurrent
/// evaluators. The host is free to persist it through serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimeline {
    events: Vec<MidiEvent>,
    ticks_per_quarter_note: u32,
    duration_ticks: u32,
}

impl EventTimeline {
    /// Builds a timeline from decoded events. SMF delta times accumulate, so
    /// input is expected in tick order already; out-of-order input is
    /// stable-sorted. The duration defaults to the final event's tick.
    pub fn new(mut events: Vec<MidiEvent>, ticks_per_quarter_note: u32) -> Self {
        if !events.is_sorted_by_key(|e| e.time) {
            events.sort_by_key(|e| e.time);
        }
        let duration_ticks = events.last().map_or(0, |e| e.time);
        Self {
            events,
            ticks_per_quarter_note,
            duration_ticks,
        }
    }

    /// Overrides the duration, e.g. with an explicit loop length.
    pub fn with_duration(mut self, duration_ticks: u32) -> Self {
        self.duration_ticks = duration_ticks;
        self
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn ticks_per_quarter_note(&self) -> u32 {
        self.ticks_per_quarter_note
    }

    pub fn duration_ticks(&self) -> u32 {
        self.duration_ticks
    }

    /// Index of the latest event for `cc_number` at or before `tick`, and of
    /// the earliest one strictly after it. Only the bracketing pair takes
    /// part in interpolation.
    pub fn cc_events_around(&self, tick: u32, cc_number: u8) -> (Option<usize>, Option<usize>) {
        let mut last = None;
        for (i, e) in self.events.iter().enumerate() {
            if !e.is_cc() || e.data1 != cc_number {
                continue;
            }
            if e.time > tick {
                return (last, Some(i));
            }
            last = Some(i);
        }
        (last, None)
    }

    /// Indices of the most recent note-on and note-off matching `filter` at
    /// or before `tick`, tracked independently of each other: last seen wins
    /// for each kind, no on/off pairing is attempted. Overlapping notes
    /// under the same filter are therefore not distinguished.
    pub fn note_events_before(
        &self,
        tick: u32,
        filter: &NoteFilter,
    ) -> (Option<usize>, Option<usize>) {
        let mut on = None;
        let mut off = None;
        for (i, e) in self.events.iter().enumerate() {
            if e.time > tick {
                break;
            }
            if !filter.matches(e) {
                continue;
            }
            if e.is_note_on() {
                on = Some(i);
            } else {
                off = Some(i);
            }
        }
        (on, off)
    }
}
