//! Drive animation parameters from Standard MIDI Files: decode the binary
//! stream into an immutable event timeline, then sample continuous control
//! values (interpolated CC curves, ADSR or keyframed note envelopes) and
//! per-frame note on/off signals from it, correctly across loops and
//! scrubbing.

pub mod control;
pub mod error;
pub mod events;
pub mod parser;
pub mod timeline;
pub mod timing;

pub use control::{Control, ControlMode, Key, NoteFilter};
pub use error::ParseError;
pub use events::MidiEvent;
pub use parser::{MidiFile, parse};
pub use timeline::EventTimeline;
pub use timing::{Curve, Envelope, Keyframe, MidiClock, MidiSignal, NoteScheduler, TrackSampler};
