//! linewire Server Binary
//!
//! Serves "Hello, world!" for every request, or a static site built from
//! `--page` arguments.

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use linewire::{hello_world, Config, Responder, Server, StaticSite};
use tracing_subscriber::{fmt, EnvFilter};

/// linewire Server
#[derive(Parser, Debug)]
#[command(name = "linewire-server")]
#[command(about = "Thread-per-connection server for the linewire get protocol")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "25565")]
    port: u16,

    /// Interface to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Initial connection pool capacity
    #[arg(short = 'c', long, default_value = "32")]
    pool_capacity: usize,

    /// Keepalive interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    keepalive_ms: u64,

    /// Serve a page instead of "Hello, world!" (format: domain/path=content, repeatable)
    #[arg(long = "page", value_name = "DOMAIN/PATH=CONTENT")]
    pages: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linewire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("linewire Server v{}", linewire::VERSION);

    let responder: Arc<dyn Responder> = if args.pages.is_empty() {
        Arc::new(hello_world())
    } else {
        match build_site(&args.pages) {
            Ok(site) => Arc::new(site),
            Err(e) => {
                tracing::error!("Invalid --page argument: {}", e);
                std::process::exit(1);
            }
        }
    };

    let config = Config::builder()
        .bind_addr(args.bind)
        .port(args.port)
        .pool_capacity(args.pool_capacity)
        .keepalive_interval_ms(args.keepalive_ms)
        .build();

    let mut server = match Server::start(config, responder) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Could not start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Could not accept connection: {}", e);
        if let Err(e) = server.close() {
            tracing::error!("Could not close server: {}", e);
        }
        std::process::exit(1);
    }
}

/// Parse `domain/path=content` entries into a site
fn build_site(pages: &[String]) -> Result<StaticSite, String> {
    let site = StaticSite::new();

    for page in pages {
        let (location, content) = page
            .split_once('=')
            .ok_or_else(|| format!("missing '=' in {:?}", page))?;
        let slash = location
            .find('/')
            .ok_or_else(|| format!("missing path in {:?}", page))?;
        let (domain, path) = location.split_at(slash);
        site.insert(domain, path, content.to_string());
    }

    Ok(site)
}
