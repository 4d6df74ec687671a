use thiserror::Error;

/// Fatal conditions raised while decoding a Standard MIDI File.
///
/// Any of these aborts the whole parse. A half-decoded track is worse than
/// no track, so no partial timeline ever escapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Bad chunk magic, header length, file format or time division.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    /// A read ran past the end of the buffer at the given byte position.
    #[error("unexpected end of data at byte {0}")]
    TruncatedStream(usize),

    /// A status byte with no known data-byte count, or a data byte with no
    /// running status to attach to. The stream cannot be resynchronized.
    #[error("unsupported status byte {0:#04x}")]
    UnsupportedEvent(u8),
}
