//! Configuration for linewire
//!
//! Centralized configuration with sensible defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{LinewireError, Result};

/// Main configuration for a linewire server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Listener Configuration
    // -------------------------------------------------------------------------
    /// Interface to bind (all interfaces by default)
    pub bind_addr: IpAddr,

    /// TCP port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// listen(2) backlog
    pub backlog: i32,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Initial number of connection slots; doubles when exhausted
    pub pool_capacity: usize,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Interval between keepalive sends on an idle connection (milliseconds)
    pub keepalive_interval_ms: u64,

    /// Sleep between command polls on an idle connection (milliseconds)
    pub poll_interval_ms: u64,

    /// Read timeout once a command is being processed (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Write timeout for responses (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Longest domain or path line accepted, delimiter excluded
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 25565,
            backlog: 10,
            pool_capacity: 32,
            keepalive_interval_ms: 1000,
            poll_interval_ms: 1,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            max_line_length: 8192,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Address the listener binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pool_capacity == 0 {
            return Err(LinewireError::Config("pool_capacity must be at least 1".to_string()));
        }
        if self.backlog <= 0 {
            return Err(LinewireError::Config(format!(
                "backlog must be positive, got {}",
                self.backlog
            )));
        }
        if self.keepalive_interval_ms == 0 {
            return Err(LinewireError::Config(
                "keepalive_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(LinewireError::Config(
                "max_line_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the interface to bind
    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the listen backlog
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.config.backlog = backlog;
        self
    }

    /// Set the initial pool capacity
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Set the keepalive interval (in milliseconds)
    pub fn keepalive_interval_ms(mut self, ms: u64) -> Self {
        self.config.keepalive_interval_ms = ms;
        self
    }

    /// Set the idle poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum line length for domain/path fields
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
