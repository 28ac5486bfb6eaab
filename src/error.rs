//! Error types for linewire
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using LinewireError
pub type Result<T> = std::result::Result<T, LinewireError>;

/// Listener setup step that failed during `Server::start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Socket,
    SetSockOpt,
    Bind,
    Listen,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::Socket => "socket",
            SetupStep::SetSockOpt => "setsockopt",
            SetupStep::Bind => "bind",
            SetupStep::Listen => "listen",
        };
        f.write_str(name)
    }
}

/// Unified error type for linewire operations
#[derive(Debug, Error)]
pub enum LinewireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Server Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Server setup failed at {step}(): {source}")]
    Setup {
        step: SetupStep,
        #[source]
        source: std::io::Error,
    },

    #[error("Accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Failed to spawn connection thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Close failed: {0}")]
    Close(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown command: 0x{0:02x}")]
    UnknownCommand(u8),

    #[error("Unknown error code: 0x{0:02x}")]
    UnknownErrorCode(u8),

    #[error("Line exceeds {0} bytes without a delimiter")]
    LineTooLong(usize),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LinewireError {
    /// Build a setup error for the given step
    pub fn setup(step: SetupStep, source: std::io::Error) -> Self {
        LinewireError::Setup { step, source }
    }

    /// The setup step that failed, if this is a setup error
    pub fn setup_step(&self) -> Option<SetupStep> {
        match self {
            LinewireError::Setup { step, .. } => Some(*step),
            _ => None,
        }
    }
}
