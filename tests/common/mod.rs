//! Shared helpers for server tests
#![allow(dead_code)]

use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use linewire::{Config, Responder, Server};

pub const DEADLINE: Duration = Duration::from_secs(5);

/// Loopback config on an ephemeral port with short intervals
pub fn test_config() -> Config {
    Config::builder()
        .bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .port(0)
        .pool_capacity(4)
        .keepalive_interval_ms(50)
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build()
}

/// Server driven by its own thread until stopped
pub struct TestServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Server>,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the accept loop and hand the server back for inspection
    pub fn stop(self) -> Server {
        self.stop.store(true, Ordering::Release);
        self.handle.join().unwrap()
    }
}

pub fn spawn_server(config: Config, responder: Arc<dyn Responder>) -> TestServer {
    let mut server = Server::start(config, responder).unwrap();
    let addr = server.local_addr();
    let stop = Arc::new(AtomicBool::new(false));

    let handle = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                server.accept_timeout(Duration::from_millis(10)).unwrap();
            }
            server
        })
    };

    TestServer { addr, stop, handle }
}

/// Drive the accept loop on the current thread until `done` holds
pub fn pump_until<F: FnMut(&Server) -> bool>(server: &mut Server, mut done: F) {
    let start = Instant::now();
    while !done(server) {
        assert!(start.elapsed() < DEADLINE, "condition not reached in time");
        server.accept_timeout(Duration::from_millis(5)).unwrap();
    }
}

/// Raw socket with a read timeout so a broken server fails the test instead of hanging
pub fn raw_connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(DEADLINE)).unwrap();
    stream
}

/// Read until the server closes, returning everything received
///
/// A reset counts as closed: the server may drop a socket with unread input.
pub fn read_to_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => break,
            Err(e) => panic!("read failed: {}", e),
        }
    }
    received
}
