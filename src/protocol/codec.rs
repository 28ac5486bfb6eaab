//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────────────┬────────────────┐
//! │ Cmd (1)  │  domain ... '\n' │  path ... '\n' │
//! └──────────┴──────────────────┴────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Code (1) │ Len (8)  │     Content (Len bytes)     │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! The length is big-endian. Content is omitted entirely when the length is 0.

use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::error::{LinewireError, Result};
use super::{Command, CommandType, ErrorCode, GetResponse, WireString};

/// Response header size: 1 byte command + 1 byte code + 8 bytes length
pub const RESPONSE_HEADER_SIZE: usize = 10;

/// Line delimiter for request fields
pub const LINE_DELIMITER: u8 = b'\n';

/// Default limit on response content a client will accept (1 GiB)
pub const MAX_CONTENT_SIZE: u64 = 1 << 30;

// =============================================================================
// Byte Order
// =============================================================================

/// Convert a 64-bit value from host to network byte order
///
/// Swaps each 32-bit half with the native 32-bit conversion and recombines
/// them; a no-op on big-endian hosts.
pub fn hton64(n: u64) -> u64 {
    if cfg!(target_endian = "big") {
        return n;
    }
    (u64::from((n as u32).to_be()) << 32) | u64::from(((n >> 32) as u32).to_be())
}

/// Convert a 64-bit value from network to host byte order
pub fn ntoh64(n: u64) -> u64 {
    if cfg!(target_endian = "big") {
        return n;
    }
    (u64::from(u32::from_be(n as u32)) << 32) | u64::from(u32::from_be((n >> 32) as u32))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Read one newline-terminated field
///
/// Reads a single byte at a time, so nothing past the delimiter is consumed.
/// The delimiter is not stored. Fails if the stream ends or errors before a
/// delimiter arrives, or if more than `max_len` bytes precede it; the partial
/// buffer is dropped in every failure case.
pub fn read_line<R: Read>(reader: &mut R, max_len: usize) -> Result<WireString> {
    let mut line = WireString::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(LinewireError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed before line delimiter",
                )));
            }
            Ok(_) => {
                if byte[0] == LINE_DELIMITER {
                    return Ok(line);
                }
                if line.len() >= max_len {
                    return Err(LinewireError::LineTooLong(max_len));
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read the body of a command whose type byte was already consumed
pub fn read_command_body<R: Read>(
    reader: &mut R,
    command_type: CommandType,
    max_line: usize,
) -> Result<Command> {
    match command_type {
        CommandType::Get => {
            let domain = read_line(reader, max_line)?;
            let path = read_line(reader, max_line)?;
            Ok(Command::Get { domain, path })
        }
    }
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R, max_line: usize) -> Result<Command> {
    let mut id = [0u8; 1];
    reader.read_exact(&mut id)?;
    let command_type = CommandType::try_from(id[0])?;
    read_command_body(reader, command_type, max_line)
}

/// Encode a `Get` request
///
/// Fields cannot contain the line delimiter; there is no escaping.
pub fn encode_get_request(domain: &[u8], path: &[u8]) -> Result<Vec<u8>> {
    for (name, field) in [("domain", domain), ("path", path)] {
        if field.contains(&LINE_DELIMITER) {
            return Err(LinewireError::Protocol(format!(
                "{} contains a line delimiter",
                name
            )));
        }
    }

    let mut message = Vec::with_capacity(1 + domain.len() + path.len() + 2);
    message.push(CommandType::Get.id());
    message.extend_from_slice(domain);
    message.push(LINE_DELIMITER);
    message.extend_from_slice(path);
    message.push(LINE_DELIMITER);

    Ok(message)
}

/// Write a `Get` request to a stream
pub fn write_get_request<W: Write>(writer: &mut W, domain: &[u8], path: &[u8]) -> Result<()> {
    let bytes = encode_get_request(domain, path)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

fn response_header(response: &GetResponse) -> [u8; RESPONSE_HEADER_SIZE] {
    let mut header = [0u8; RESPONSE_HEADER_SIZE];
    header[0] = CommandType::Get.id();
    header[1] = response.code as u8;
    header[2..].copy_from_slice(&hton64(response.len()).to_ne_bytes());
    header
}

/// Encode a `Get` response to bytes
pub fn encode_get_response(response: &GetResponse) -> Vec<u8> {
    let mut message = Vec::with_capacity(RESPONSE_HEADER_SIZE + response.content.len());
    message.extend_from_slice(&response_header(response));
    message.extend_from_slice(&response.content);
    message
}

/// Write a `Get` response to a stream
///
/// Writes the command id, code, length and content in order. Any failed
/// write is returned as-is; the caller is expected to drop the connection.
pub fn write_get_response<W: Write>(writer: &mut W, response: &GetResponse) -> Result<()> {
    let header = response_header(response);
    writer.write_all(&header[..1])?;
    writer.write_all(&header[1..2])?;
    writer.write_all(&header[2..])?;

    if !response.content.is_empty() {
        writer.write_all(&response.content)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a complete `Get` response from a stream
///
/// Content longer than [`MAX_CONTENT_SIZE`] is refused before anything is
/// allocated for it.
pub fn read_get_response<R: Read>(reader: &mut R) -> Result<GetResponse> {
    read_get_response_with_limit(reader, MAX_CONTENT_SIZE)
}

/// Like [`read_get_response`], with a caller-chosen content limit in bytes
///
/// The announced length is checked before the content is read, so an
/// oversized response leaves its content unread on the stream.
pub fn read_get_response_with_limit<R: Read>(
    reader: &mut R,
    max_content: u64,
) -> Result<GetResponse> {
    let mut header = [0u8; RESPONSE_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if header[0] != CommandType::Get.id() {
        return Err(LinewireError::Protocol(format!(
            "Unexpected command echo: 0x{:02x}",
            header[0]
        )));
    }

    let code = ErrorCode::try_from(header[1])?;

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[2..]);
    let len = ntoh64(u64::from_ne_bytes(len_bytes));

    let too_large = || {
        LinewireError::Protocol(format!(
            "Response content too large: {} bytes (max {})",
            len, max_content
        ))
    };
    if len > max_content {
        return Err(too_large());
    }
    let len = usize::try_from(len).map_err(|_| too_large())?;

    let mut content = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut content)?;
    }

    Ok(GetResponse {
        code,
        content: Bytes::from(content),
    })
}

/// Decode a `Get` response from bytes
pub fn decode_get_response(bytes: &[u8]) -> Result<GetResponse> {
    let mut reader = bytes;
    let response = read_get_response(&mut reader)?;

    if !reader.is_empty() {
        return Err(LinewireError::Protocol(format!(
            "{} trailing bytes after response",
            reader.len()
        )));
    }

    Ok(response)
}
