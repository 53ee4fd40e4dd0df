//! Chat relay server binary
//!
//! Usage:
//!   cargo run                          # listen on the default port
//!   cargo run -- --port 12345         # listen on a specific port
//!   cargo run -- --save-dir ./logs    # where /save writes chat logs

use std::env;
use std::path::PathBuf;

use parley::{ChatServer, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();
    if let Some(port) = parse_flag(&args, "--port") {
        let port: u16 = port.parse()?;
        config.bind_addr.set_port(port);
    }
    if let Some(dir) = parse_flag(&args, "--save-dir") {
        config.save_dir = PathBuf::from(dir);
    }

    info!(addr = %config.bind_addr, "starting chat relay");
    let mut server = ChatServer::new(config);
    server.run().await?;

    Ok(())
}

fn print_usage() {
    println!("Parley - line-based multi-room chat relay");
    println!();
    println!("USAGE:");
    println!("    cargo run -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>         Port to listen on (default: 12345)");
    println!("    --save-dir <DIR>      Directory for /save chat logs (default: .)");
    println!("    -h, --help            Show this help message");
    println!();
    println!("PROTOCOL:");
    println!("    Connect with any line-based client, e.g. `nc 127.0.0.1 12345`.");
    println!("    The first line you send is your display name; after that use");
    println!("    /list /users /create /join <room> /roomusers /save /exit /bye");
    println!("    or @<id> <message> to whisper. Anything else is room chat.");
}

fn parse_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
