//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

use crate::error::LinewireError;

/// Response error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Success = 0x00,
    PageNotFound = 0x01,
    BadPath = 0x02,
    UnknownDomain = 0x03,
}

impl TryFrom<u8> for ErrorCode {
    type Error = LinewireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(ErrorCode::Success),
            0x01 => Ok(ErrorCode::PageNotFound),
            0x02 => Ok(ErrorCode::BadPath),
            0x03 => Ok(ErrorCode::UnknownDomain),
            other => Err(LinewireError::UnknownErrorCode(other)),
        }
    }
}

/// A response to a `Get` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResponse {
    /// Error code
    pub code: ErrorCode,

    /// Content; empty for most error responses
    pub content: Bytes,
}

impl GetResponse {
    /// Create a successful response carrying `content`
    pub fn success(content: impl Into<Bytes>) -> Self {
        Self {
            code: ErrorCode::Success,
            content: content.into(),
        }
    }

    /// Create a response with the given code and no content
    pub fn error(code: ErrorCode) -> Self {
        Self {
            code,
            content: Bytes::new(),
        }
    }

    pub fn page_not_found() -> Self {
        Self::error(ErrorCode::PageNotFound)
    }

    pub fn bad_path() -> Self {
        Self::error(ErrorCode::BadPath)
    }

    pub fn unknown_domain() -> Self {
        Self::error(ErrorCode::UnknownDomain)
    }

    /// Content length as sent on the wire
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
