//! Frame codec: 2-byte big-endian length prefix around an ASCII command.

use super::error::{Result, TerminalError};

/// Size of the length header on both directions.
pub const HEADER_SIZE: usize = 2;

/// Frame a command for transmission.
///
/// Frame structure:
/// - Length (2 bytes, BE): byte length of the command, header excluded
/// - Command (ASCII)
pub fn encode(command: &str) -> Result<Vec<u8>> {
    if !command.is_ascii() {
        return Err(TerminalError::NonAscii);
    }
    let len = u16::try_from(command.len()).map_err(|_| TerminalError::FrameTooLarge(command.len()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + command.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(command.as_bytes());
    Ok(frame)
}

/// Decode a response: drop the 2-byte header and read the rest as Latin-1.
///
/// Every byte maps to the character with the same code point, so receipt
/// text with extended characters survives and character offsets equal byte
/// offsets.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().skip(HEADER_SIZE).map(|&b| char::from(b)).collect()
}

/// Length carried in a frame header, if the buffer holds one.
pub fn header_length(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [hi, lo, ..] => Some(usize::from(u16::from_be_bytes([*hi, *lo]))),
        _ => None,
    }
}
