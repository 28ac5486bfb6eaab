//! # linewire
//!
//! A small TCP server for a line-oriented, length-prefixed get protocol:
//! - Single-byte commands with newline-terminated string fields
//! - Typed, length-prefixed binary responses
//! - One thread per connection, recycled through a growable slot pool
//! - Zero-length keepalive sends on idle connections
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Acceptor Thread                            │
//! │              (blocking accept → channel)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Server                                  │
//! │            accept() / reap() on caller thread                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Connection  │   ...    │ Connection  │   (pooled threads)
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │       Responder (domain, path)      │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod responder;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LinewireError, Result, SetupStep};
pub use config::Config;
pub use network::{Client, Server};
pub use protocol::{ErrorCode, GetResponse, WireString};
pub use responder::{hello_world, Responder, StaticSite};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of linewire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
