//! Standard MIDI File deserialization.

use tracing::{debug, trace};

use crate::error::ParseError;
use crate::events::MidiEvent;
use crate::timeline::EventTimeline;

use super::ByteCursor;

/// A fully decoded Standard MIDI File: one timeline per track chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    pub format: u16,
    pub tracks: Vec<EventTimeline>,
}

/// Decodes a Standard MIDI File buffer.
///
/// The parse is all-or-nothing: any structural problem aborts it and no
/// partial track survives. Only note and control-change events are kept;
/// other channel messages are consumed to keep the stream aligned and then
/// dropped.
pub fn parse(data: &[u8]) -> Result<MidiFile, ParseError> {
    let mut cursor = ByteCursor::new(data);

    if cursor.read_chars(4)? != b"MThd" {
        return Err(ParseError::MalformedHeader("missing MThd chunk"));
    }
    if cursor.read_u32_be()? != 6 {
        return Err(ParseError::MalformedHeader("header chunk length must be 6"));
    }
    let format = cursor.read_u16_be()?;
    if format > 2 {
        return Err(ParseError::MalformedHeader("unknown file format"));
    }
    let track_count = cursor.read_u16_be()?;
    let division = cursor.read_u16_be()?;
    if division & 0x8000 != 0 {
        return Err(ParseError::MalformedHeader(
            "SMPTE time division is not supported",
        ));
    }

    let mut tracks = Vec::with_capacity(usize::from(track_count));
    for index in 0..track_count {
        let track = read_track(&mut cursor, u32::from(division))?;
        trace!(
            track = index,
            events = track.events().len(),
            "decoded track chunk"
        );
        tracks.push(track);
    }

    debug!(format, tracks = tracks.len(), "parsed standard midi file");
    Ok(MidiFile { format, tracks })
}

fn read_track(
    cursor: &mut ByteCursor<'_>,
    ticks_per_quarter_note: u32,
) -> Result<EventTimeline, ParseError> {
    if cursor.read_chars(4)? != b"MTrk" {
        return Err(ParseError::MalformedHeader("missing MTrk chunk"));
    }
    let chunk_length = cursor.read_u32_be()? as usize;
    let chunk_end = cursor.position().saturating_add(chunk_length);

    let mut events = Vec::new();
    let mut ticks = 0u32;
    let mut status = 0u8;

    while cursor.position() < chunk_end {
        ticks = ticks.saturating_add(cursor.read_var_len()?);

        // Running status: a data byte here reuses the previous status.
        if cursor.peek_byte()? & 0x80 != 0 {
            status = cursor.read_byte()?;
        } else if status == 0 {
            return Err(ParseError::UnsupportedEvent(cursor.peek_byte()?));
        }

        match status {
            0xFF => {
                let meta_type = cursor.read_byte()?;
                let length = cursor.read_var_len()?;
                cursor.skip(length as usize)?;
                if meta_type == 0x2F {
                    // End of Track; realign to the declared chunk boundary.
                    cursor.seek(chunk_end);
                    break;
                }
            }
            0xF0 | 0xF7 => {
                let length = cursor.read_var_len()?;
                cursor.skip(length as usize)?;
            }
            _ => match status & 0xF0 {
                0x80 | 0x90 | 0xB0 => {
                    let data1 = cursor.read_byte()?;
                    let data2 = cursor.read_byte()?;
                    events.push(MidiEvent {
                        time: ticks,
                        status,
                        data1,
                        data2,
                    });
                }
                // Consumed only to keep the stream position correct.
                0xA0 | 0xE0 => cursor.skip(2)?,
                0xC0 | 0xD0 => cursor.skip(1)?,
                _ => return Err(ParseError::UnsupportedEvent(status)),
            },
        }
    }

    Ok(EventTimeline::new(events, ticks_per_quarter_note))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(format: u16, track_count: u16, division: u16) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&format.to_be_bytes());
        bytes.extend_from_slice(&track_count.to_be_bytes());
        bytes.extend_from_slice(&division.to_be_bytes());
        bytes
    }

    fn track_chunk(body: &[u8]) -> Vec<u8> {
        let mut bytes = b"MTrk".to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    fn single_track_file(body: &[u8]) -> Vec<u8> {
        let mut bytes = header(0, 1, 96);
        bytes.extend_from_slice(&track_chunk(body));
        bytes
    }

    #[test]
    fn decodes_notes_and_control_changes_at_absolute_ticks() {
        let file = single_track_file(&[
            0x00, 0x90, 60, 100, // note on at tick 0
            0x60, 0xB0, 1, 64, // CC1 at tick 96
            0x81, 0x40, 0x80, 60, 0, // note off at tick 96 + 192
        ]);
        let parsed = parse(&file).unwrap();
        assert_eq!(parsed.format, 0);
        assert_eq!(parsed.tracks.len(), 1);

        let events = parsed.tracks[0].events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            MidiEvent {
                time: 0,
                status: 0x90,
                data1: 60,
                data2: 100
            }
        );
        assert_eq!(
            events[1],
            MidiEvent {
                time: 96,
                status: 0xB0,
                data1: 1,
                data2: 64
            }
        );
        assert_eq!(
            events[2],
            MidiEvent {
                time: 288,
                status: 0x80,
                data1: 60,
                data2: 0
            }
        );
        assert_eq!(parsed.tracks[0].ticks_per_quarter_note(), 96);
        assert_eq!(parsed.tracks[0].duration_ticks(), 288);
    }

    #[test]
    fn running_status_reuses_previous_status_byte() {
        let file = single_track_file(&[
            0x00, 0x90, 60, 100, // explicit status
            0x10, 62, 100, // running status, still a note on
        ]);
        let events = parse(&file).unwrap().tracks.remove(0);
        let events = events.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, 0x90);
        assert_eq!(events[1].status, 0x90);
        assert_eq!(events[1].data1, 62);
        assert_eq!(events[1].time, 16);
    }

    #[test]
    fn data_byte_without_running_status_is_rejected() {
        let file = single_track_file(&[0x00, 60, 100]);
        assert_eq!(parse(&file), Err(ParseError::UnsupportedEvent(60)));
    }

    #[test]
    fn rejects_bad_header_magic() {
        let mut file = single_track_file(&[0x00, 0x90, 60, 100]);
        file[..4].copy_from_slice(b"XXXX");
        assert_eq!(
            parse(&file),
            Err(ParseError::MalformedHeader("missing MThd chunk"))
        );
    }

    #[test]
    fn rejects_bad_header_length() {
        let mut file = single_track_file(&[]);
        file[7] = 7;
        assert_eq!(
            parse(&file),
            Err(ParseError::MalformedHeader("header chunk length must be 6"))
        );
    }

    #[test]
    fn rejects_unknown_format() {
        let file = {
            let mut bytes = header(3, 0, 96);
            bytes.extend_from_slice(&track_chunk(&[]));
            bytes
        };
        assert_eq!(
            parse(&file),
            Err(ParseError::MalformedHeader("unknown file format"))
        );
    }

    #[test]
    fn rejects_smpte_division() {
        let mut bytes = header(0, 1, 0);
        let division_offset = bytes.len() - 2;
        bytes[division_offset] = 0xE7; // -25 fps SMPTE encoding
        bytes[division_offset + 1] = 40;
        bytes.extend_from_slice(&track_chunk(&[]));
        assert_eq!(
            parse(&bytes),
            Err(ParseError::MalformedHeader(
                "SMPTE time division is not supported"
            ))
        );
    }

    #[test]
    fn rejects_missing_track_chunk() {
        let mut file = single_track_file(&[0x00, 0x90, 60, 100]);
        file[14..18].copy_from_slice(b"XTrk");
        assert_eq!(
            parse(&file),
            Err(ParseError::MalformedHeader("missing MTrk chunk"))
        );
    }

    #[test]
    fn truncated_event_fails_the_whole_parse() {
        let mut file = single_track_file(&[0x00, 0x90, 60, 100]);
        file.truncate(file.len() - 1);
        // The chunk header still promises four bytes of events.
        assert!(matches!(
            parse(&file),
            Err(ParseError::TruncatedStream(_))
        ));
    }

    #[test]
    fn rejects_system_common_status() {
        let file = single_track_file(&[0x00, 0xF4, 0x00]);
        assert_eq!(parse(&file), Err(ParseError::UnsupportedEvent(0xF4)));
    }

    #[test]
    fn skipped_channel_messages_keep_the_stream_aligned() {
        let file = single_track_file(&[
            0x00, 0xC0, 12, // program change, dropped
            0x00, 0xD0, 64, // channel pressure, dropped
            0x00, 0xA0, 60, 40, // polyphonic pressure, dropped
            0x00, 0xE0, 0x00, 0x40, // pitch bend, dropped
            0x10, 0x90, 60, 100, // the event that must survive
        ]);
        let track = parse(&file).unwrap().tracks.remove(0);
        assert_eq!(track.events().len(), 1);
        assert_eq!(track.events()[0].time, 16);
        assert!(track.events()[0].is_note_on());
    }

    #[test]
    fn meta_and_sysex_are_skipped() {
        let file = single_track_file(&[
            0x00, 0xFF, 0x03, 0x04, b'l', b'e', b'a', b'd', // track name meta
            0x00, 0xF0, 0x02, 0x01, 0xF7, // sysex with varlen payload
            0x20, 0x90, 60, 100,
        ]);
        let track = parse(&file).unwrap().tracks.remove(0);
        assert_eq!(track.events().len(), 1);
        assert_eq!(track.events()[0].time, 32);
    }

    #[test]
    fn end_of_track_meta_stops_the_walk() {
        let file = single_track_file(&[
            0x00, 0x90, 60, 100, //
            0x00, 0xFF, 0x2F, 0x00, // end of track
            0x00, 0x90, 62, 100, // inside the declared chunk, but unreachable
        ]);
        let track = parse(&file).unwrap().tracks.remove(0);
        assert_eq!(track.events().len(), 1);
        assert_eq!(track.events()[0].data1, 60);
    }

    #[test]
    fn decodes_multiple_tracks() {
        let mut file = header(1, 2, 480);
        file.extend_from_slice(&track_chunk(&[
            0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x00,
        ]));
        file.extend_from_slice(&track_chunk(&[
            0x00, 0xB0, 7, 90, 0x00, 0xFF, 0x2F, 0x00,
        ]));
        let parsed = parse(&file).unwrap();
        assert_eq!(parsed.format, 1);
        assert_eq!(parsed.tracks.len(), 2);
        assert!(parsed.tracks[0].events()[0].is_note_on());
        assert!(parsed.tracks[1].events()[0].is_cc());
        assert_eq!(parsed.tracks[1].ticks_per_quarter_note(), 480);
    }

    #[test]
    fn zero_velocity_note_on_keeps_its_status() {
        let file = single_track_file(&[0x00, 0x90, 60, 0]);
        let track = parse(&file).unwrap().tracks.remove(0);
        assert!(track.events()[0].is_note_on());
        assert_eq!(track.events()[0].data2, 0);
    }
}
