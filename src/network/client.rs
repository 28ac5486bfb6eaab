//! Blocking client
//!
//! One request at a time over a single TCP connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{
    read_get_response_with_limit, write_get_request, GetResponse, MAX_CONTENT_SIZE,
};

/// Client for a linewire server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Largest response content accepted, in bytes
    max_content_size: u64,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            max_content_size: MAX_CONTENT_SIZE,
        })
    }

    /// Configure read/write timeouts (None blocks forever)
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Refuse responses announcing more than `max` bytes of content
    ///
    /// Defaults to 1 GiB. A refused response leaves the connection out of
    /// sync, so the client should be dropped afterwards.
    pub fn set_max_content_size(&mut self, max: u64) {
        self.max_content_size = max;
    }

    pub fn max_content_size(&self) -> u64 {
        self.max_content_size
    }

    /// Send a `Get` request and wait for its response
    pub fn get(&mut self, domain: &str, path: &str) -> Result<GetResponse> {
        write_get_request(&mut self.writer, domain.as_bytes(), path.as_bytes())?;
        read_get_response_with_limit(&mut self.reader, self.max_content_size)
    }
}
