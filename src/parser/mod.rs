mod cursor;
mod smf;

pub use cursor::ByteCursor;
pub use smf::{MidiFile, parse};
