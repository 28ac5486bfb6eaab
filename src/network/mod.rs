//! Network Module
//!
//! TCP server, connection pool and client.
//!
//! ## Architecture
//! - Single acceptor thread feeding a channel
//! - One pooled thread per connection, reaped by the accepting caller
//! - Requests answered through a shared `Responder`

mod server;
mod connection;
mod pool;
mod client;

pub use server::Server;
pub use connection::Connection;
pub use pool::{ConnectionPool, FinishSignal, SlotId, SlotState, VacantSlot};
pub use client::Client;
