//! Command definitions
//!
//! Represents requests from clients.

use crate::error::LinewireError;
use super::WireString;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = b'G',
}

impl CommandType {
    /// Wire byte for this command
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CommandType {
    type Error = LinewireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'G' => Ok(CommandType::Get),
            other => Err(LinewireError::UnknownCommand(other)),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the content at `path` on `domain`
    Get { domain: WireString, path: WireString },
}
