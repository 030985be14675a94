//! Line-based chat server example
//!
//! Run with: cargo run --example chat_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example chat_server                    # binds to 0.0.0.0:8000
//!   cargo run --example chat_server localhost          # binds to 127.0.0.1:8000
//!   cargo run --example chat_server 127.0.0.1:8001     # binds to 127.0.0.1:8001
//!
//! ## Chatting
//!
//! Connect with any line-based client, e.g.:
//!   nc localhost 8000
//!
//! The first line you type is your display name; every line after that is
//! sent to the room as `name: line`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chat_relay::server::config::DEFAULT_PORT;
use chat_relay::{ChatServer, ServerConfig};

fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: chat_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => ServerConfig::with_addr(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_relay=debug".parse()?)
                .add_directive("chat_server=debug".parse()?),
        )
        .init();

    println!("Starting chat server on {}", config.bind_addr);
    println!("Connect with: nc {} {}", config.bind_addr.ip(), config.bind_addr.port());
    println!();

    let server = Arc::new(ChatServer::new(config));

    // Periodic room summary
    let stats_server = Arc::clone(&server);
    let stats_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let registry = stats_server.registry().stats().await;
            let server = stats_server.stats();
            tracing::info!(
                members = registry.members,
                broadcasts = registry.broadcasts,
                evictions = registry.evictions,
                connections = server.active_connections,
                "Room stats"
            );
        }
    });

    let result = server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await;

    stats_task.abort();

    if let Err(e) = result {
        eprintln!("Server error: {}", e);
    }

    Ok(())
}
