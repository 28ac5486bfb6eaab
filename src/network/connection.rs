//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## State machine
//! ```text
//!   AwaitingCommand ──byte──▶ Processing ──▶ Responding ──▶ AwaitingCommand
//!          │                      │               │
//!          └──────────────────────┴───────────────┴──error──▶ Closed
//! ```

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{LinewireError, Result};
use crate::network::pool::FinishSignal;
use crate::protocol::{read_command_body, write_get_response, Command, CommandType};
use crate::responder::Responder;

/// Protocol state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    AwaitingCommand,
    Processing,
    Responding,
    Closed,
}

/// Outcome of polling for a command byte
enum Poll {
    Command(u8),
    Idle,
}

/// Handles a single client connection
pub struct Connection {
    /// Accepted socket; toggled between non-blocking (idle) and blocking (request)
    stream: TcpStream,

    /// Shared responder
    responder: Arc<dyn Responder>,

    state: ConnectionState,

    keepalive_interval: Duration,
    poll_interval: Duration,
    max_line_length: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Disables Nagle and applies the configured read/write timeouts, which
    /// only matter while a request is being processed.
    pub fn new(stream: TcpStream, responder: Arc<dyn Responder>, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        Ok(Self {
            stream,
            responder,
            state: ConnectionState::AwaitingCommand,
            keepalive_interval: config.keepalive_interval(),
            poll_interval: config.poll_interval(),
            max_line_length: config.max_line_length,
            peer_addr,
        })
    }

    /// Run the protocol loop until the connection closes
    ///
    /// Always shuts the socket down and fires `finished` on the way out.
    pub fn run(mut self, finished: FinishSignal) {
        tracing::debug!(slot = finished.slot(), "Client {} connected", self.peer_addr);

        match self.serve() {
            Ok(()) => tracing::debug!("Client {} disconnected", self.peer_addr),
            Err(LinewireError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
            }
            Err(e) => tracing::warn!(
                state = ?self.state,
                "Closing connection to {}: {}",
                self.peer_addr,
                e
            ),
        }

        self.close();
        drop(self);
        finished.finish();
    }

    fn serve(&mut self) -> Result<()> {
        let mut last_keepalive = Instant::now();

        loop {
            match self.poll_command()? {
                Poll::Command(id) => {
                    self.stream.set_nonblocking(false)?;
                    self.handle_command(id)?;
                    self.state = ConnectionState::AwaitingCommand;
                }
                Poll::Idle => {
                    if last_keepalive.elapsed() >= self.keepalive_interval {
                        self.send_keepalive()?;
                        last_keepalive = Instant::now();
                    }
                    thread::sleep(self.poll_interval);
                }
            }
        }
    }

    /// Try to read one command byte without blocking
    ///
    /// A clean EOF surfaces as an `UnexpectedEof` I/O error so the caller
    /// treats it like any other disconnect.
    fn poll_command(&mut self) -> Result<Poll> {
        self.stream.set_nonblocking(true)?;

        let mut id = [0u8; 1];
        loop {
            return match self.stream.read(&mut id) {
                Ok(0) => Err(LinewireError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                ))),
                Ok(_) => Ok(Poll::Command(id[0])),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Poll::Idle),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e.into()),
            };
        }
    }

    fn handle_command(&mut self, id: u8) -> Result<()> {
        self.state = ConnectionState::Processing;

        let command_type = CommandType::try_from(id)?;
        let command = read_command_body(&mut self.stream, command_type, self.max_line_length)?;

        match command {
            Command::Get { domain, path } => {
                tracing::trace!(
                    "Get from {}: domain={} path={}",
                    self.peer_addr,
                    domain,
                    path
                );

                let response = self.responder.respond(&domain, &path);

                self.state = ConnectionState::Responding;
                let sent = write_get_response(&mut self.stream, &response);

                match &sent {
                    Ok(()) => tracing::trace!(
                        code = ?response.code,
                        len = response.len(),
                        "Sent get response to {}",
                        self.peer_addr
                    ),
                    Err(e) => tracing::debug!(
                        "Failed to send get response to {}: {}",
                        self.peer_addr,
                        e
                    ),
                }

                sent
            }
        }
    }

    /// Zero-length send on the socket
    ///
    /// Only catches sockets the local stack already knows are dead; a
    /// half-open peer goes unnoticed.
    fn send_keepalive(&mut self) -> Result<()> {
        match self.stream.write(&[]) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        self.state = ConnectionState::Closed;
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::trace!("Shutdown of {} failed: {}", self.peer_addr, e);
            }
        }
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
