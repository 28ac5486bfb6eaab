//! linewire CLI Client
//!
//! Sends a single get request and prints the response.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use linewire::{Client, ErrorCode};

/// linewire CLI
#[derive(Parser, Debug)]
#[command(name = "linewire-get")]
#[command(about = "Fetch a page from a linewire server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:25565")]
    server: String,

    /// Read/write timeout in milliseconds (0 waits forever)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Domain to request
    domain: String,

    /// Path to request
    #[arg(default_value = "/")]
    path: String,
}

fn main() {
    let args = Args::parse();

    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));

    let result = Client::connect(&args.server).and_then(|mut client| {
        client.set_timeouts(timeout, timeout)?;
        client.get(&args.domain, &args.path)
    });

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if response.code != ErrorCode::Success {
        eprintln!("{:?} ({} bytes)", response.code, response.len());
        std::process::exit(2);
    }

    let mut stdout = std::io::stdout();
    if let Err(e) = stdout.write_all(&response.content).and_then(|_| stdout.flush()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
