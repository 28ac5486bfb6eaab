//! Growable string buffer
//!
//! Holds the domain/path fields read off the wire and can be frozen into
//! response content without copying.

use std::fmt;
use std::ops::Deref;

use bytes::{Bytes, BytesMut};

/// Initial capacity of a freshly allocated string
pub const INITIAL_CAPACITY: usize = 32;

/// A growable byte string with explicit length and capacity
///
/// Capacity doubles whenever an append would overflow it. Contents are raw
/// bytes; nothing requires them to be valid UTF-8.
#[derive(Clone, PartialEq, Eq)]
pub struct WireString {
    buf: BytesMut,
}

impl WireString {
    /// Create an empty string with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(cap.max(1)),
        }
    }

    /// Append one byte, doubling capacity when full
    pub fn push(&mut self, byte: u8) {
        if self.buf.len() == self.buf.capacity() {
            let cap = self.buf.capacity().max(1);
            self.buf.reserve(cap);
        }
        self.buf.extend_from_slice(&[byte]);
    }

    /// Append a slice of bytes
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// View as `&str` if the contents are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.buf).ok()
    }

    /// Convert into immutable bytes, e.g. to hand back as response content
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for WireString {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for WireString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsRef<[u8]> for WireString {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<&[u8]> for WireString {
    fn from(bytes: &[u8]) -> Self {
        let mut s = Self::with_capacity(bytes.len().max(INITIAL_CAPACITY));
        s.buf.extend_from_slice(bytes);
        s
    }
}

impl From<&str> for WireString {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl PartialEq<str> for WireString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for WireString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for WireString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.buf))
    }
}

impl fmt::Debug for WireString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireString({:?})", String::from_utf8_lossy(&self.buf))
    }
}
