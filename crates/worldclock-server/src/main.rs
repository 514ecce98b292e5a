//! Worldclock sync server
//!
//! ```bash
//! worldclock-server --listen 127.0.0.1:8787 --data-dir /var/lib/worldclock
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use worldclock_core::Storage;
use worldclock_server::AppState;

/// Worldclock sync server - stores one timezone set per user
#[derive(Parser)]
#[command(name = "worldclock-server")]
#[command(version = "0.1.0")]
#[command(about = "Worldclock sync server - stores one timezone set per user")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.worldclock/server)
    #[arg(short, long, env = "WORLDCLOCK_SERVER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default data directory (~/.worldclock/server)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".worldclock")
        .join("server")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let storage = Storage::open_in(&data_dir)
        .with_context(|| format!("opening storage in {}", data_dir.display()))?;

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;
    let server = worldclock_server::serve(listener, AppState::new(storage)).await?;
    println!("Listening on http://{}", server.addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.shutdown().await;

    Ok(())
}
