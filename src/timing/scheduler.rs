//! Per-frame note notification emission.

use std::sync::Arc;

use tracing::trace;

use crate::events::MidiEvent;
use crate::timeline::EventTimeline;

use super::MidiClock;

/// Widest window, in seconds, scanned when the playhead jumps forward while
/// scrubbing. Anything older is dropped on purpose.
const MAX_SCRUB_WINDOW: f32 = 0.1;

/// One note notification, carrying a copy of the event that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiSignal {
    pub event: MidiEvent,
}

/// Emits note on/off signals exactly once per event crossed by the playhead.
///
/// One scheduler belongs to one playback instance; only the timeline behind
/// the `Arc` is shared. Signals returned by [`advance`](Self::advance) stay
/// valid until the next call on the same scheduler, and the backing buffer
/// is reused across frames so steady-state playback does not allocate.
#[derive(Debug, Clone)]
pub struct NoteScheduler {
    timeline: Arc<EventTimeline>,
    clock: MidiClock,
    previous_time: Option<f32>,
    signals: Vec<MidiSignal>,
}

impl NoteScheduler {
    pub fn new(timeline: Arc<EventTimeline>, clock: MidiClock) -> Self {
        Self {
            timeline,
            clock,
            previous_time: None,
            signals: Vec::new(),
        }
    }

    pub fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    /// Moves the playhead without emitting anything.
    pub fn reset(&mut self, time: f32) {
        self.previous_time = Some(time);
    }

    /// Advances the playhead to `time` and returns the note events crossed
    /// since the previous frame, unwrapping loop boundaries in between. The
    /// first call after construction or [`finish`](Self::finish) only seats
    /// the playhead.
    ///
    /// With `scrubbing` set, a forward jump of 0.1 s or more scans only the
    /// trailing 0.1 s before `time`; stale events further back are
    /// deliberately dropped rather than delivered as a burst.
    pub fn advance(&mut self, time: f32, scrubbing: bool) -> &[MidiSignal] {
        self.signals.clear();

        let Some(previous) = self.previous_time.replace(time) else {
            return &self.signals;
        };

        let mut from = previous;
        if scrubbing && time - previous >= MAX_SCRUB_WINDOW {
            from = (time - MAX_SCRUB_WINDOW).max(0.0);
            trace!(previous, time, "playhead jump, clamping signal window");
        }

        self.collect(from, time);
        &self.signals
    }

    /// Flushes everything between the last seen time and `end_time`
    /// (typically the clip end) and returns the scheduler to idle.
    pub fn finish(&mut self, end_time: f32) -> &[MidiSignal] {
        self.signals.clear();
        if let Some(previous) = self.previous_time.take() {
            self.collect(previous, end_time);
        }
        &self.signals
    }

    fn collect(&mut self, previous: f32, current: f32) {
        let duration = u64::from(self.timeline.duration_ticks().max(1));
        let mut t0 = u64::from(self.clock.ticks_from_seconds(previous));
        let mut t1 = u64::from(self.clock.ticks_from_seconds(current));

        // A backwards move means the playhead wrapped; unwrap it onto the
        // cycle t0 lives in.
        if t1 < t0 {
            t1 += (t0 / duration + 1) * duration;
        }

        let offset = (t0 / duration) * duration;
        t0 -= offset;
        t1 -= offset;

        // One pass per loop boundary crossed.
        while t1 >= duration {
            self.collect_ticks(t0 as u32, u32::MAX);
            t0 = 0;
            t1 -= duration;
        }
        self.collect_ticks(t0 as u32, t1 as u32);
    }

    /// Queues matching note events with ticks in `[from, to)`.
    fn collect_ticks(&mut self, from: u32, to: u32) {
        for event in self.timeline.events() {
            if event.time >= to {
                break;
            }
            if event.time < from || !event.is_note() {
                continue;
            }
            self.signals.push(MidiSignal { event: *event });
        }
    }
}
