//! Control bindings: which MIDI events drive a parameter, and how.

use serde::{Deserialize, Serialize};

use crate::events::MidiEvent;
use crate::timing::{Curve, Envelope, Keyframe};

/// Pitch class of a MIDI note number (`data1 % 12`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

/// Selects the notes a control listens to. `None` fields match everything.
///
/// Octaves follow the convention that puts MIDI note 0 in octave -2, so the
/// usable range is -2..=8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFilter {
    pub note: Option<Key>,
    pub octave: Option<i8>,
}

impl NoteFilter {
    /// Matches any note event regardless of pitch class or octave.
    pub const ALL: Self = Self {
        note: None,
        octave: None,
    };

    pub fn matches(&self, event: &MidiEvent) -> bool {
        event.is_note()
            && self
                .octave
                .is_none_or(|o| i32::from(event.data1 / 12) == i32::from(o) + 2)
            && self.note.is_none_or(|k| event.data1 % 12 == k as u8)
    }
}

/// How a control derives its value from the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    #[default]
    NoteEnvelope,
    NoteCurve,
    ControlChange,
}

/// One animatable parameter binding.
///
/// The core computes the normalized scalar for the active mode; blending it
/// into the `value_off`/`value_on` pair and pushing the result at a scene
/// object stays with the host. The 4-component pair covers scalar, vector,
/// euler-rotation and color targets uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub enabled: bool,
    pub mode: ControlMode,
    /// (Note modes) which notes drive the value.
    pub note_filter: NoteFilter,
    /// (NoteEnvelope mode) ADSR dials.
    pub envelope: Envelope,
    /// (NoteCurve mode) value over seconds since note-on.
    pub curve: Curve,
    /// (ControlChange mode) controller number.
    pub cc_number: u8,
    pub value_off: [f32; 4],
    pub value_on: [f32; 4],
}

impl Control {
    /// Blends the off/on vectors by `t`, clamped to [0, 1].
    pub fn blend(&self, t: f32) -> [f32; 4] {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0.0; 4];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.value_off[i] + (self.value_on[i] - self.value_off[i]) * t;
        }
        out
    }
}

impl Default for Control {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ControlMode::NoteEnvelope,
            note_filter: NoteFilter::ALL,
            envelope: Envelope::default(),
            curve: Curve::new(vec![
                Keyframe::with_tangents(0.0, 0.0, 90.0, 90.0),
                Keyframe::new(0.02, 1.0),
                Keyframe::new(0.5, 0.0),
            ]),
            cc_number: 1,
            value_off: [0.0; 4],
            value_on: [1.0, 1.0, 1.0, 0.0],
        }
    }
}
