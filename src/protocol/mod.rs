//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────────────┬────────────────┐
//! │ Cmd (1)  │  domain ... '\n' │  path ... '\n' │
//! └──────────┴──────────────────┴────────────────┘
//! ```
//!
//! ### Commands
//! - 'G' (0x47): GET - Body: domain line + path line
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┐
//! │ Cmd (1)  │ Code (1) │ Len (8)  │      Content      │
//! └──────────┴──────────┴──────────┴───────────────────┘
//! ```
//!
//! ### Error Codes
//! - 0x00: SUCCESS
//! - 0x01: PAGE_NOT_FOUND
//! - 0x02: BAD_PATH
//! - 0x03: UNKNOWN_DOMAIN

mod command;
mod response;
mod wire_string;
pub mod codec;

pub use command::{Command, CommandType};
pub use response::{ErrorCode, GetResponse};
pub use wire_string::WireString;
pub use codec::{
    encode_get_request, write_get_request, read_command, read_command_body, read_line,
    encode_get_response, decode_get_response, write_get_response, read_get_response,
    read_get_response_with_limit, MAX_CONTENT_SIZE,
    hton64, ntoh64,
};
