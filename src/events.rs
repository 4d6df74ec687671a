use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized MIDI channel event pinned to an absolute tick.
///
/// `time` is non-decreasing within a track. Classification is derived from
/// the status byte rather than stored; a velocity-0 note-on keeps its
/// literal 0x9x status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub time: u32,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiEvent {
    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.status & 0xF0 == 0x90
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.status & 0xF0 == 0x80
    }

    /// Note-on or note-off.
    #[inline]
    pub fn is_note(&self) -> bool {
        self.status & 0xE0 == 0x80
    }

    #[inline]
    pub fn is_cc(&self) -> bool {
        self.status & 0xB0 == 0xB0
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: {:X}, {}, {}]",
            self.time, self.status, self.data1, self.data2
        )
    }
}
