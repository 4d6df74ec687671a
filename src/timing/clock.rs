/// Converts between playback seconds and MIDI ticks at a fixed tempo.
///
/// The constructor clamps tempo and resolution to small positive minimums,
/// so the conversions stay finite even on degenerate caller input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiClock {
    tempo: f32,
    ticks_per_quarter_note: u32,
}

impl MidiClock {
    /// Lowest accepted tempo, in beats per minute.
    pub const MIN_TEMPO: f32 = 1e-3;

    pub fn new(tempo: f32, ticks_per_quarter_note: u32) -> Self {
        Self {
            tempo: tempo.max(Self::MIN_TEMPO),
            ticks_per_quarter_note: ticks_per_quarter_note.max(1),
        }
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn ticks_per_quarter_note(&self) -> u32 {
        self.ticks_per_quarter_note
    }

    /// Truncating conversion; tick counters only ever observe whole ticks.
    pub fn ticks_from_seconds(&self, time: f32) -> u32 {
        (time * self.tempo / 60.0 * self.ticks_per_quarter_note as f32) as u32
    }

    pub fn seconds_from_ticks(&self, ticks: u32) -> f32 {
        ticks as f32 * 60.0 / (self.tempo * self.ticks_per_quarter_note as f32)
    }
}
