//! Incremental message parsing for the ModLink bus.
//!
//! Frame format:
//! - START (1 byte): 0x02 synchronization byte
//! - COMMAND (0-8 bytes): printable command verb
//! - DELIM (1 byte): 0x1F command/field separator
//! - SOURCE (1 byte): raw sender address
//! - DEST (1 byte): raw destination address
//! - FIELDS (up to 3): printable values separated by DELIM
//! - TERM (1 byte): 0x03 end-of-frame byte
//!
//! Source and destination are raw 8-bit values, never delimiter-escaped;
//! the parser reads them positionally so any byte value is a valid address.

use heapless::String;

use crate::addr::Addr;

/// Frame synchronization byte (ASCII STX)
pub const START_MARKER: u8 = 0x02;
/// Separator between command, and between fields (ASCII unit separator)
pub const FIELD_DELIM: u8 = 0x1F;
/// End-of-frame byte (ASCII ETX)
pub const TERMINATOR: u8 = 0x03;

/// Maximum stored length of a command verb in bytes
pub const COMMAND_LENGTH: usize = 8;
/// Number of field slots in a message
pub const NUM_FIELDS: usize = 3;
/// Maximum stored length of a single field in bytes
pub const FIELD_LENGTH: usize = 32;

/// Parser position within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum ParseState {
    /// Waiting for the start marker
    ReadingStart,
    /// Accumulating the command verb
    ReadingCommand,
    /// Next byte is the source address
    ReadingSource,
    /// Next byte is the destination address
    ReadingDest,
    /// Accumulating field values
    ReadingField,
    /// Frame complete; further bytes are ignored until reset
    Done,
}

/// Returns true for bytes allowed inside command and field values.
///
/// Content is printable ASCII plus space, which keeps the content domain
/// disjoint from the control-byte framing constants.
fn is_content(byte: u8) -> bool {
    byte == b' ' || byte.is_ascii_graphic()
}

/// One parsed or in-progress bus message
///
/// A `Message` is both the parser and its output: the caller embeds one per
/// channel (no heap involved), feeds it received bytes via
/// [`parse_byte`](Message::parse_byte), and reads the command, addresses,
/// and fields once parsing reports completion. Reuse the same storage for
/// the next frame by calling [`reset`](Message::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    command: String<COMMAND_LENGTH>,
    source: u8,
    dest: u8,
    fields: [String<FIELD_LENGTH>; NUM_FIELDS],
    state: ParseState,
    write_field: usize,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// Create an empty message, ready to parse a frame
    pub fn new() -> Self {
        Self {
            command: String::new(),
            source: 0,
            dest: 0,
            fields: core::array::from_fn(|_| String::new()),
            state: ParseState::ReadingStart,
            write_field: 0,
        }
    }

    /// Reset to a fresh state, abandoning any parsed or partial frame
    ///
    /// Safe to call at any time, including mid-frame. Must be called after
    /// a completed frame before this message can parse the next one.
    pub fn reset(&mut self) {
        self.command.clear();
        self.source = 0;
        self.dest = 0;
        for field in &mut self.fields {
            field.clear();
        }
        self.state = ParseState::ReadingStart;
        self.write_field = 0;
    }

    /// Feed a single received byte to the parser
    ///
    /// Advances the frame by at most one state transition and never blocks,
    /// so this can be called directly from a receive interrupt. Returns
    /// `true` exactly once, on the byte that completes the frame. Bytes
    /// delivered after completion are ignored and return `false`.
    ///
    /// Malformed input degrades silently instead of failing: bytes before
    /// the start marker are dropped for resynchronization, oversized
    /// commands and fields are truncated at capacity, and content past the
    /// last field slot is discarded until the terminator.
    pub fn parse_byte(&mut self, byte: u8) -> bool {
        match self.state {
            ParseState::ReadingStart => {
                if byte == START_MARKER {
                    self.state = ParseState::ReadingCommand;
                }
                // Anything else is line noise or a torn previous frame
                false
            }
            ParseState::ReadingCommand => {
                if byte == FIELD_DELIM {
                    self.state = ParseState::ReadingSource;
                } else if is_content(byte) {
                    // Push failure means the verb is full; truncate
                    let _ = self.command.push(byte as char);
                }
                false
            }
            ParseState::ReadingSource => {
                self.source = byte;
                self.state = ParseState::ReadingDest;
                false
            }
            ParseState::ReadingDest => {
                self.dest = byte;
                self.state = ParseState::ReadingField;
                false
            }
            ParseState::ReadingField => match byte {
                TERMINATOR => {
                    self.state = ParseState::Done;
                    true
                }
                FIELD_DELIM => {
                    // Delimiters past the last slot are dropped along with
                    // whatever content follows them
                    if self.write_field < NUM_FIELDS {
                        self.write_field += 1;
                    }
                    false
                }
                byte if is_content(byte) => {
                    if let Some(field) = self.fields.get_mut(self.write_field) {
                        let _ = field.push(byte as char);
                    }
                    false
                }
                _ => false,
            },
            ParseState::Done => false,
        }
    }

    /// Feed a slice of received bytes
    ///
    /// Returns `true` if a byte in the slice completed the frame; bytes
    /// after the completing byte are not consumed.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> bool {
        bytes.iter().any(|&byte| self.parse_byte(byte))
    }

    /// Returns true once a full frame has been parsed
    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Done
    }

    /// The command verb
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Raw source address byte
    pub fn source(&self) -> u8 {
        self.source
    }

    /// Raw destination address byte
    pub fn dest(&self) -> u8 {
        self.dest
    }

    /// Source address interpreted as a controller role
    pub fn source_addr(&self) -> Addr {
        Addr::from_byte(self.source)
    }

    /// Destination address interpreted as a controller role
    pub fn dest_addr(&self) -> Addr {
        Addr::from_byte(self.dest)
    }

    /// Read a field by index
    ///
    /// Returns `None` for `index >= NUM_FIELDS`. Valid once
    /// [`is_complete`](Message::is_complete) returns true; on an
    /// in-progress message this returns whatever partial content has
    /// arrived so far, which is useful for diagnostics but not for
    /// protocol decisions. The returned slice borrows the message's own
    /// storage and goes away on the next [`reset`](Message::reset).
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|field| field.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_mov() {
        let mut frame = std::vec::Vec::new();
        frame.push(START_MARKER);
        frame.extend_from_slice(b"MOV");
        frame.push(FIELD_DELIM);
        frame.push(0x03); // source: module at address 3
        frame.push(0x05); // dest: module at address 5
        frame.push(b'A');
        frame.push(FIELD_DELIM);
        frame.push(b'B');
        frame.push(FIELD_DELIM);
        frame.push(b'C');
        frame.push(TERMINATOR);

        let mut message = Message::new();
        for (i, &byte) in frame.iter().enumerate() {
            let done = message.parse_byte(byte);
            assert_eq!(done, i == frame.len() - 1, "byte {i} reported wrong completion");
        }

        assert!(message.is_complete());
        assert_eq!(message.command(), "MOV");
        assert_eq!(message.source(), 3);
        assert_eq!(message.dest(), 5);
        assert_eq!(message.source_addr(), Addr::Module(3));
        assert_eq!(message.field(0), Some("A"));
        assert_eq!(message.field(1), Some("B"));
        assert_eq!(message.field(2), Some("C"));
    }

    #[test]
    fn test_address_bytes_may_collide_with_delimiters() {
        // 0x03 is also TERMINATOR, but address bytes are positional
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'P', FIELD_DELIM]);
        assert!(!message.parse_byte(TERMINATOR)); // source
        assert!(!message.parse_byte(FIELD_DELIM)); // dest
        assert!(message.parse_byte(TERMINATOR));
        assert_eq!(message.source(), TERMINATOR);
        assert_eq!(message.dest(), FIELD_DELIM);
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut message = Message::new();
        assert!(!message.parse_bytes(&[0x00, 0xFF, b'x', 0x7F]));

        let mut frame = std::vec::Vec::new();
        frame.push(START_MARKER);
        frame.extend_from_slice(b"PING");
        frame.push(FIELD_DELIM);
        frame.push(1);
        frame.push(0);
        frame.push(TERMINATOR);

        assert!(message.parse_bytes(&frame));
        assert_eq!(message.command(), "PING");
        assert_eq!(message.source_addr(), Addr::Prime);
        assert_eq!(message.dest_addr(), Addr::Broadcast);
    }

    #[test]
    fn test_command_truncated_at_capacity() {
        let mut message = Message::new();
        message.parse_byte(START_MARKER);
        // COMMAND_LENGTH + 5 bytes of verb
        for &byte in b"ABCDEFGHIJKLM" {
            message.parse_byte(byte);
        }
        message.parse_bytes(&[FIELD_DELIM, 1, 2]);
        assert!(message.parse_byte(TERMINATOR));

        assert_eq!(message.command(), "ABCDEFGH");
        assert_eq!(message.command().len(), COMMAND_LENGTH);
    }

    #[test]
    fn test_field_truncated_at_capacity() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'S', FIELD_DELIM, 2, 3]);
        for _ in 0..FIELD_LENGTH + 8 {
            message.parse_byte(b'z');
        }
        assert!(message.parse_byte(TERMINATOR));

        assert_eq!(message.field(0).unwrap().len(), FIELD_LENGTH);
        assert_eq!(message.field(1), Some(""));
    }

    #[test]
    fn test_excess_fields_discarded() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'X', FIELD_DELIM, 1, 2]);
        message.parse_bytes(&[
            b'a', FIELD_DELIM, b'b', FIELD_DELIM, b'c', FIELD_DELIM, b'd', b'e', FIELD_DELIM,
            b'f',
        ]);
        assert!(message.parse_byte(TERMINATOR));

        assert_eq!(message.field(0), Some("a"));
        assert_eq!(message.field(1), Some("b"));
        assert_eq!(message.field(2), Some("c"));
        assert_eq!(message.field(3), None);
    }

    #[test]
    fn test_empty_fields() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'N', FIELD_DELIM, 1, 2]);
        assert!(message.parse_byte(TERMINATOR));

        assert!(message.is_complete());
        assert_eq!(message.field(0), Some(""));
        assert_eq!(message.field(2), Some(""));
    }

    #[test]
    fn test_bytes_after_completion_ignored() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'Q', FIELD_DELIM, 1, 2, b'v']);
        assert!(message.parse_byte(TERMINATOR));

        let before = message.clone();
        assert!(!message.parse_byte(START_MARKER));
        assert!(!message.parse_byte(b'w'));
        assert!(!message.parse_byte(TERMINATOR));
        assert_eq!(message, before);
    }

    #[test]
    fn test_nonprintable_content_discarded() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'U', 0x07, b'P', FIELD_DELIM, 1, 2]);
        message.parse_bytes(&[b'o', 0x01, b'k']);
        assert!(message.parse_byte(TERMINATOR));

        assert_eq!(message.command(), "UP");
        assert_eq!(message.field(0), Some("ok"));
    }

    #[test]
    fn test_reset_mid_frame() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'O', b'L', b'D', FIELD_DELIM, 9, 9, b'x']);
        message.reset();
        assert_eq!(message, Message::new());

        message.parse_bytes(&[START_MARKER, b'N', b'E', b'W', FIELD_DELIM, 1, 2]);
        assert!(message.parse_byte(TERMINATOR));
        assert_eq!(message.command(), "NEW");
        assert_eq!(message.source(), 1);
        assert_eq!(message.field(0), Some(""));
    }

    #[test]
    fn test_reset_after_completion() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'A', FIELD_DELIM, 1, 2, b'v']);
        assert!(message.parse_byte(TERMINATOR));

        message.reset();
        assert!(!message.is_complete());
        assert_eq!(message.command(), "");
        assert_eq!(message.field(0), Some(""));
    }

    #[test]
    fn test_partial_read_mid_parse() {
        let mut message = Message::new();
        message.parse_bytes(&[START_MARKER, b'M', b'O']);
        assert!(!message.is_complete());
        assert_eq!(message.command(), "MO");

        message.parse_bytes(&[FIELD_DELIM, 4, 5, b'h', b'i']);
        assert_eq!(message.field(0), Some("hi"));
    }
}
