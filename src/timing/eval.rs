//! Continuous control-value evaluation against a timeline.

use crate::control::{Control, ControlMode};
use crate::events::MidiEvent;
use crate::timeline::EventTimeline;

use super::MidiClock;

/// Samples control values out of one timeline at arbitrary playback times.
///
/// A stateless read-only view; any number of samplers can read the same
/// decoded track concurrently.
#[derive(Debug, Clone, Copy)]
pub struct TrackSampler<'a> {
    timeline: &'a EventTimeline,
    clock: MidiClock,
}

impl<'a> TrackSampler<'a> {
    pub fn new(timeline: &'a EventTimeline, clock: MidiClock) -> Self {
        Self { timeline, clock }
    }

    /// Normalized value of `control` at `time` seconds. Playback time wraps
    /// around the clip duration. With no matching history the value is 0.
    pub fn value(&self, control: &Control, time: f32) -> f32 {
        let time = self.wrap(time);
        match control.mode {
            ControlMode::NoteEnvelope => self.note_envelope_value(control, time),
            ControlMode::NoteCurve => self.note_curve_value(control, time),
            ControlMode::ControlChange => self.cc_value(control, time),
        }
    }

    fn wrap(&self, time: f32) -> f32 {
        let duration = self
            .clock
            .seconds_from_ticks(self.timeline.duration_ticks());
        if duration > 0.0 { time % duration } else { time }
    }

    /// Step-and-hold with a lerp between the bracketing pair: the held value
    /// before the next event, 0 before any history exists.
    fn cc_value(&self, control: &Control, time: f32) -> f32 {
        let tick = self.clock.ticks_from_seconds(time);
        let (i0, i1) = self.timeline.cc_events_around(tick, control.cc_number);

        let Some(i0) = i0 else { return 0.0 };
        let e0 = &self.timeline.events()[i0];
        let v0 = normalized(e0.data2);

        let Some(i1) = i1 else { return v0 };
        let e1 = &self.timeline.events()[i1];
        let v1 = normalized(e1.data2);

        let t0 = self.clock.seconds_from_ticks(e0.time);
        let t1 = self.clock.seconds_from_ticks(e1.time);
        if t1 - t0 <= f32::EPSILON {
            return v1;
        }
        lerp(v0, v1, (time - t0) / (t1 - t0))
    }

    fn note_envelope_value(&self, control: &Control, time: f32) -> f32 {
        let Some((on, off_time)) = self.note_window(control, time) else {
            return 0.0;
        };
        let on_time = self.clock.seconds_from_ticks(on.time);
        let level = control
            .envelope
            .value((off_time - on_time).max(0.0), (time - off_time).max(0.0));
        level * normalized(on.data2)
    }

    fn note_curve_value(&self, control: &Control, time: f32) -> f32 {
        let Some((on, _)) = self.note_window(control, time) else {
            return 0.0;
        };
        let on_time = self.clock.seconds_from_ticks(on.time);
        control.curve.evaluate((time - on_time).max(0.0)) * normalized(on.data2)
    }

    /// The governing note-on at `time`, paired with the moment the note
    /// stopped sounding (`time` itself while it is still held).
    fn note_window(&self, control: &Control, time: f32) -> Option<(&'a MidiEvent, f32)> {
        let tick = self.clock.ticks_from_seconds(time);
        let (i_on, i_off) = self
            .timeline
            .note_events_before(tick, &control.note_filter);
        let i_on = i_on?;
        let on = &self.timeline.events()[i_on];
        let off_time = match i_off {
            Some(i_off) if i_off > i_on => self
                .clock
                .seconds_from_ticks(self.timeline.events()[i_off].time),
            _ => time,
        };
        Some((on, off_time))
    }
}

fn normalized(data: u8) -> f32 {
    f32::from(data) / 127.0
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
