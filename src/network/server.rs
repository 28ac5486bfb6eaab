//! TCP Server
//!
//! Accepts connections and dispatches each one to its own pooled thread.
//!
//! A dedicated acceptor thread blocks in `accept(2)` and forwards every
//! accepted socket (or accept error) over a channel. [`Server::accept`] only
//! polls that channel, so it never blocks, and it reaps finished connection
//! threads on every call.
//!
//! The channel holds at most `backlog` sockets. While nobody drives
//! [`Server::accept`] the acceptor stops taking connections off the listen
//! queue, so the kernel backlog applies again.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{
    self, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError,
};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::Config;
use crate::error::{LinewireError, Result, SetupStep};
use crate::network::connection::Connection;
use crate::network::pool::ConnectionPool;
use crate::responder::Responder;

/// How long `run` waits for a connection before reaping anyway
const REAP_INTERVAL: Duration = Duration::from_millis(100);

/// Pause after an accept error so a persistent failure (e.g. EMFILE) does not spin
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Timeout for the self-connection that wakes the acceptor on close
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// How often a blocked hand-off rechecks the shutdown flag
const HANDOFF_RECHECK: Duration = Duration::from_millis(50);

type Incoming = io::Result<TcpStream>;

/// TCP server for the linewire protocol
pub struct Server {
    config: Config,

    /// Address the listener actually bound (resolves port 0)
    local_addr: SocketAddr,

    responder: Arc<dyn Responder>,

    pool: ConnectionPool,

    /// Accepted sockets from the acceptor thread
    incoming: Receiver<Incoming>,

    /// Acceptor thread; owns the listening socket
    acceptor: Option<JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Start listening with the given config
    ///
    /// Creates the pool, then the listening socket (`SO_REUSEADDR`, bound on
    /// `config.listen_addr()`), then the acceptor thread. Socket setup
    /// failures name the step that failed and are not retried.
    pub fn start(config: Config, responder: Arc<dyn Responder>) -> Result<Self> {
        config.validate()?;

        let pool = ConnectionPool::with_capacity(config.pool_capacity);
        let listener = create_listener(config.listen_addr(), config.backlog)?;
        let local_addr = listener.local_addr()?;

        let (tx, incoming) = channel::bounded(config.backlog as usize);
        let shutdown = Arc::new(AtomicBool::new(false));

        let acceptor = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("linewire-acceptor".to_string())
                .spawn(move || accept_loop(listener, tx, shutdown))
                .map_err(LinewireError::Spawn)?
        };

        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            local_addr,
            responder,
            pool,
            incoming,
            acceptor: Some(acceptor),
            shutdown,
        })
    }

    /// Start on all interfaces on `port` with default settings
    pub fn bind(port: u16, responder: Arc<dyn Responder>) -> Result<Self> {
        Self::start(Config::builder().port(port).build(), responder)
    }

    /// Admit at most one pending connection without blocking, then reap
    ///
    /// No pending connection is not an error. Accept failures are returned to
    /// the caller, who decides whether to keep going. Meant to be called in a
    /// loop; prefer [`Server::accept_timeout`] or [`Server::run`] to avoid
    /// spinning.
    pub fn accept(&mut self) -> Result<()> {
        let attempt = match self.incoming.try_recv() {
            Ok(incoming) => Some(incoming),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(acceptor_stopped())),
        };
        self.finish_accept(attempt)
    }

    /// Like [`Server::accept`], but waits up to `timeout` for a connection
    pub fn accept_timeout(&mut self, timeout: Duration) -> Result<()> {
        let attempt = match self.incoming.recv_timeout(timeout) {
            Ok(incoming) => Some(incoming),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(acceptor_stopped())),
        };
        self.finish_accept(attempt)
    }

    /// Accept and reap until an accept error occurs
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.accept_timeout(REAP_INTERVAL)?;
        }
    }

    /// Stop accepting and release the pool
    ///
    /// Closes the listening socket. Connections still running are left to
    /// finish on their own; their threads are detached, not joined.
    pub fn close(mut self) -> Result<()> {
        let result = self.stop_acceptor();
        tracing::info!(
            active = self.pool.active(),
            "Server on {} closed",
            self.local_addr
        );
        result
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn finish_accept(&mut self, attempt: Option<Incoming>) -> Result<()> {
        let result = match attempt {
            None => Ok(()),
            Some(Ok(stream)) => self.admit(stream),
            Some(Err(e)) => Err(LinewireError::Accept(e)),
        };

        self.pool.reap();
        result
    }

    /// Bind an accepted socket to a pool slot and start its thread
    fn admit(&mut self, stream: TcpStream) -> Result<()> {
        let connection = match Connection::new(stream, Arc::clone(&self.responder), &self.config) {
            Ok(connection) => connection,
            Err(e) => {
                // The peer may already be gone; that is the connection's problem, not ours
                tracing::warn!("Dropping accepted connection: {}", e);
                return Ok(());
            }
        };

        let slot = self.pool.spawn(move |finished| connection.run(finished))?;
        tracing::trace!(slot, live = self.pool.live(), "Connection admitted");

        Ok(())
    }

    fn stop_acceptor(&mut self) -> Result<()> {
        let Some(acceptor) = self.acceptor.take() else {
            return Ok(());
        };

        self.shutdown.store(true, Ordering::Release);

        // accept(2) only returns on a connection, so make one
        let wake_addr = wake_address(self.local_addr);
        if let Err(e) = TcpStream::connect_timeout(&wake_addr, WAKE_TIMEOUT) {
            // A full listen queue refuses the wake, but then the acceptor is
            // parked on the hand-off and sees the flag by itself
            if !wait_finished(&acceptor, WAKE_TIMEOUT) {
                return Err(LinewireError::Close(format!(
                    "could not wake acceptor on {}: {}",
                    wake_addr, e
                )));
            }
        }

        acceptor
            .join()
            .map_err(|_| LinewireError::Close("acceptor thread panicked".to_string()))
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(e) = self.stop_acceptor() {
            tracing::warn!("Server shutdown: {}", e);
        }
    }
}

/// Create the listening socket, one named step at a time
fn create_listener(addr: SocketAddr, backlog: i32) -> Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| LinewireError::setup(SetupStep::Socket, e))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| LinewireError::setup(SetupStep::SetSockOpt, e))?;

    socket
        .bind(&addr.into())
        .map_err(|e| LinewireError::setup(SetupStep::Bind, e))?;

    socket
        .listen(backlog)
        .map_err(|e| LinewireError::setup(SetupStep::Listen, e))?;

    Ok(socket.into())
}

fn accept_loop(listener: TcpListener, tx: Sender<Incoming>, shutdown: Arc<AtomicBool>) {
    loop {
        let result = listener.accept().map(|(stream, _)| stream);

        if shutdown.load(Ordering::Acquire) {
            break;
        }

        let failed = match &result {
            Ok(_) => false,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => true,
        };

        if !hand_off(&tx, result, &shutdown) {
            break;
        }

        if failed {
            thread::sleep(ACCEPT_ERROR_BACKOFF);
        }
    }

    tracing::debug!("Acceptor stopped");
}

/// Queue an accept result, waiting while the queue is full
///
/// Returns false once the server is shutting down or gone; the pending
/// socket is dropped then.
fn hand_off(tx: &Sender<Incoming>, mut item: Incoming, shutdown: &AtomicBool) -> bool {
    loop {
        match tx.send_timeout(item, HANDOFF_RECHECK) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if shutdown.load(Ordering::Acquire) {
                    return false;
                }
                item = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

fn wait_finished(handle: &JoinHandle<()>, timeout: Duration) -> bool {
    let start = Instant::now();
    while !handle.is_finished() {
        if start.elapsed() >= timeout {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}

fn acceptor_stopped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "acceptor thread stopped")
}

/// Loopback equivalent of a wildcard bind address
fn wake_address(local: SocketAddr) -> SocketAddr {
    match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), local.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), local.port())
        }
        _ => local,
    }
}
