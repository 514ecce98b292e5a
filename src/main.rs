//! Worldclock CLI
//!
//! Terminal front end for the timezone dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # Show every card at the current time
//! worldclock list
//!
//! # What time is it everywhere when it's 15:00 at home?
//! worldclock list --at 15:00
//!
//! # Add a city from the built-in table
//! worldclock add tokyo
//!
//! # Add any IANA zone
//! worldclock add --city "Base Camp" --timezone Asia/Kathmandu
//!
//! # Live view, ticking every second
//! worldclock watch
//!
//! # Sync the set with a server
//! WORLDCLOCK_REMOTE_URL=http://localhost:8787 WORLDCLOCK_TOKEN=alice worldclock list
//! ```

mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use worldclock_core::config::default_data_dir;
use worldclock_core::{
    CityData, ClockConfig, Dashboard, EntryId, EntryPatch, SyncEvent, SyncStatus,
};

/// Upper bound on waiting for a pending push before exit
const PUSH_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Worldclock - one virtual clock across every timezone you care about
#[derive(Parser)]
#[command(name = "worldclock")]
#[command(version = "0.1.0")]
#[command(about = "Worldclock - one virtual clock across every timezone you care about")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.worldclock/data)
    #[arg(short, long, global = true, env = "WORLDCLOCK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Timezone of the home card (default: detected from the host)
    #[arg(long, global = true, env = "WORLDCLOCK_HOME_TZ")]
    home_tz: Option<String>,

    /// Sync server base URL
    #[arg(long, global = true, env = "WORLDCLOCK_REMOTE_URL")]
    remote_url: Option<String>,

    /// Bearer token for the sync server; sync is off without it
    #[arg(long, global = true, env = "WORLDCLOCK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every card
    List {
        /// Show the cards as of this local time (HH:MM) on one card
        #[arg(long)]
        at: Option<String>,

        /// Card whose local time `--at` sets (default: home)
        #[arg(long, requires = "at")]
        on: Option<String>,
    },

    /// Add a timezone card
    Add {
        /// City to look up in the built-in table
        #[arg(conflicts_with_all = ["city", "timezone"])]
        query: Option<String>,

        /// City label
        #[arg(long, requires = "timezone")]
        city: Option<String>,

        /// Country label
        #[arg(long, requires = "city")]
        country: Option<String>,

        /// IANA timezone identifier
        #[arg(long, requires = "city")]
        timezone: Option<String>,
    },

    /// Replace the city of a card with a table lookup
    Update {
        /// Card ID
        id: String,
        /// City to look up in the built-in table
        query: String,
    },

    /// Remove a card
    Remove {
        /// Card ID
        id: String,
    },

    /// Select a card and show it
    Select {
        /// Card ID
        id: String,
    },

    /// Search the built-in city table
    Cities {
        /// Text to match against city, country or timezone
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Live view, re-rendered every tick
    Watch {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        seconds: Option<u64>,
    },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn build_config(cli: &Cli) -> ClockConfig {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let mut config = ClockConfig::new(data_dir);

    if let Some(tz) = &cli.home_tz {
        config = config.with_home_timezone(tz);
    }

    match (&cli.remote_url, &cli.token) {
        (Some(url), Some(token)) if !token.is_empty() => {
            config = config.with_remote(url, token);
        }
        (Some(_), _) => info!("No token given, running without sync"),
        _ => {}
    }

    config
}

/// Look up the first table match for `query`
fn lookup_city(dashboard: &Dashboard, query: &str) -> Result<CityData> {
    dashboard
        .controller()
        .cities()
        .search(query, 1)
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No city matches '{}'", query))
}

fn print_cards(dashboard: &Dashboard) {
    for card in dashboard.cards() {
        match card {
            Ok(card) => println!("{}", render::card_line(&card)),
            Err(e) => println!("  (unrenderable card: {})", e),
        }
    }
}

fn print_header(dashboard: &Dashboard) {
    let utc = chrono::DateTime::from_timestamp_millis(dashboard.base_time())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    println!(
        "Timezones ({})  {}  [{}]",
        dashboard.controller().len(),
        utc,
        render::offset_summary(dashboard.time_offset())
    );
    println!();
}

/// Block until no push is pending: the last one was delivered or failed
async fn wait_for_sync(dashboard: &Dashboard) {
    let Some(mut events) = dashboard.controller().subscribe_sync() else {
        return;
    };
    if dashboard.controller().sync_status() != SyncStatus::Pending {
        return;
    }

    debug!("Waiting for pending push");
    let wait = async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::Pushed { count }) => {
                    info!(count, "Synced");
                }
                Ok(SyncEvent::Failed { message }) => {
                    eprintln!("Sync failed: {}", message);
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
            // An edit made while a push was in flight is still queued
            if dashboard.controller().sync_status() != SyncStatus::Pending {
                break;
            }
        }
    };
    if tokio::time::timeout(PUSH_WAIT_TIMEOUT, wait).await.is_err() {
        eprintln!("Sync did not complete; changes are saved locally");
    }
}

async fn watch(dashboard: &Dashboard, seconds: Option<u64>) -> Result<()> {
    let mut ticks = dashboard
        .subscribe_ticks()
        .context("dashboard is not ticking")?;
    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    let clear = std::io::stdout().is_terminal();

    loop {
        if clear {
            print!("\x1b[2J\x1b[H");
        }
        print_header(dashboard);
        print_cards(dashboard);

        let stop = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = stop => break,
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = build_config(&cli);
    let mut dashboard = Dashboard::open(&config)
        .await
        .with_context(|| format!("opening {}", config.data_dir().display()))?;
    dashboard.mount().await;

    match cli.command {
        Commands::List { at, on } => {
            if let Some(at) = at {
                let minutes = render::parse_hh_mm(&at)?;
                let id = on.map(EntryId::from).unwrap_or_else(EntryId::home);
                dashboard.drag(&id, minutes)?;
            }
            print_header(&dashboard);
            print_cards(&dashboard);
        }

        Commands::Add {
            query,
            city,
            country,
            timezone,
        } => {
            let city = match (query, city, timezone) {
                (Some(query), _, _) => lookup_city(&dashboard, &query)?,
                (None, Some(city), Some(timezone)) => {
                    CityData::new(city, country.unwrap_or_default(), timezone)
                }
                _ => anyhow::bail!("Give a city to look up, or --city and --timezone"),
            };
            let label = format!("{} ({})", city.city, city.timezone);
            let id = dashboard.controller_mut().add(city)?;
            println!("Added: {}", label);
            println!("  ID: {}", id);
        }

        Commands::Update { id, query } => {
            let id = EntryId::from(id);
            let city = lookup_city(&dashboard, &query)?;
            let label = format!("{} ({})", city.city, city.timezone);
            if !dashboard
                .controller_mut()
                .update(&id, EntryPatch::from_city(&city))?
            {
                anyhow::bail!("No card with ID '{}'", id);
            }
            println!("Updated {}: {}", id, label);
        }

        Commands::Remove { id } => {
            let id = EntryId::from(id);
            dashboard.controller_mut().remove(&id)?;
            println!("Removed: {}", id);
        }

        Commands::Select { id } => {
            let id = EntryId::from(id);
            if !dashboard.controller_mut().set_selected(Some(id.clone())) {
                anyhow::bail!("No card with ID '{}'", id);
            }
            let card = dashboard.card(&id)?;
            println!("{}", render::card_line(&card));
            println!("  Timezone: {}", card.timezone);
            println!("  Slider: {} / 1439", card.slider_minutes());
            println!("  Removable: {}", if card.can_delete { "Yes" } else { "No" });
        }

        Commands::Cities { query, limit } => {
            let cities = dashboard.controller().cities().search(&query, limit);
            if cities.is_empty() {
                println!("No cities match '{}'.", query);
            } else {
                println!("Cities ({}):", cities.len());
                for city in &cities {
                    println!("{}", render::city_line(city));
                }
            }
        }

        Commands::Watch { seconds } => {
            watch(&dashboard, seconds).await?;
        }
    }

    wait_for_sync(&dashboard).await;
    dashboard.unmount();
    Ok(())
}
