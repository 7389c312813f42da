//! Frame construction for outgoing bus messages

use heapless::Vec;

use crate::message::{
    COMMAND_LENGTH, FIELD_DELIM, FIELD_LENGTH, NUM_FIELDS, START_MARKER, TERMINATOR,
};

/// Maximum encoded frame size: START + command + DELIM + SOURCE + DEST
/// + fields with interior delimiters + TERM
pub const MAX_FRAME_SIZE: usize =
    1 + COMMAND_LENGTH + 1 + 2 + NUM_FIELDS * FIELD_LENGTH + (NUM_FIELDS - 1) + 1;

/// Errors that can occur while constructing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Command exceeds `COMMAND_LENGTH` bytes
    CommandTooLong,
    /// A field exceeds `FIELD_LENGTH` bytes
    FieldTooLong,
    /// More than `NUM_FIELDS` fields supplied
    TooManyFields,
    /// Command or field contains a non-printable or delimiter byte
    InvalidContent,
    /// Buffer too small for encoding
    BufferTooSmall,
}

fn check_content(value: &str) -> Result<(), EncodeError> {
    if value
        .bytes()
        .all(|byte| byte == b' ' || byte.is_ascii_graphic())
    {
        Ok(())
    } else {
        Err(EncodeError::InvalidContent)
    }
}

/// A validated, ready-to-encode message description
///
/// Borrows the command and field values; nothing is copied until
/// [`encode`](MessageWriter::encode). Receivers fill unsent trailing
/// fields with empty values, so a writer may carry fewer than
/// `NUM_FIELDS` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageWriter<'a> {
    command: &'a str,
    source: u8,
    dest: u8,
    fields: &'a [&'a str],
}

impl<'a> MessageWriter<'a> {
    /// Validate a message description for encoding
    pub fn new(
        command: &'a str,
        source: u8,
        dest: u8,
        fields: &'a [&'a str],
    ) -> Result<Self, EncodeError> {
        if command.len() > COMMAND_LENGTH {
            return Err(EncodeError::CommandTooLong);
        }
        check_content(command)?;
        if fields.len() > NUM_FIELDS {
            return Err(EncodeError::TooManyFields);
        }
        for field in fields {
            if field.len() > FIELD_LENGTH {
                return Err(EncodeError::FieldTooLong);
            }
            check_content(field)?;
        }

        Ok(Self {
            command,
            source,
            dest,
            fields,
        })
    }

    /// Encode this message into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let field_bytes: usize = self.fields.iter().map(|field| field.len()).sum();
        let frame_len =
            1 + self.command.len() + 1 + 2 + field_bytes + self.fields.len().saturating_sub(1) + 1;
        if buffer.len() < frame_len {
            return Err(EncodeError::BufferTooSmall);
        }

        let mut at = 0;
        buffer[at] = START_MARKER;
        at += 1;
        buffer[at..at + self.command.len()].copy_from_slice(self.command.as_bytes());
        at += self.command.len();
        buffer[at] = FIELD_DELIM;
        at += 1;
        buffer[at] = self.source;
        at += 1;
        buffer[at] = self.dest;
        at += 1;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                buffer[at] = FIELD_DELIM;
                at += 1;
            }
            buffer[at..at + field.len()].copy_from_slice(field.as_bytes());
            at += field.len();
        }
        buffer[at] = TERMINATOR;
        at += 1;

        Ok(at)
    }

    /// Encode this message into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, EncodeError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| EncodeError::BufferTooSmall)?;
        Ok(vec)
    }
}
