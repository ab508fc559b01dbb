//! # FARSIGHT Display
//!
//! Headless display: connects to a provider, keeps the widget tree laid out
//! and reports callbacks until the provider ends the session.
//!
//! ```bash
//! # Defaults: provider on 127.0.0.1:1309, 640x480
//! ./farsight-display
//!
//! # Explicit config, verbose protocol logs
//! RUST_LOG=farsight=trace ./farsight-display display.toml
//!
//! # Connect to the first provider answering a discovery probe
//! ./farsight-display --discover
//! ```

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use farsight::net::ResourceCache;
use farsight::{DisplayConfig, DisplayLoop, DisplayLoopConfig, Session};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG: &str = "farsight.toml";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "farsight=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let discover = args.iter().any(|arg| arg == "--discover" || arg == "-d");
    let config_path = args
        .iter()
        .find(|arg| !arg.starts_with('-'))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);

    let mut config = DisplayConfig::load(&config_path)?;
    if discover {
        let found = farsight::net::discover(DISCOVERY_TIMEOUT).context("Discovery failed")?;
        let first = found.first().context("No provider answered the discovery probe")?;
        info!("Discovered provider '{}' at {}", first.name, first.addr);
        config.provider = first.addr;
    }

    let header = config.connect_header()?;
    let session = Session::new(config.screen(), config.conversion_options());
    let mut cache = ResourceCache::new();
    let (mut display, outcome) =
        DisplayLoop::connect(config.provider, &header, &mut cache, session, DisplayLoopConfig::default())
            .with_context(|| format!("Failed to connect to {}", config.provider))?;
    info!(
        "Session with {} open: {} of {} resources transferred",
        config.provider,
        outcome.requested.len(),
        outcome.announced.len()
    );

    let running = AtomicBool::new(true);
    display.run(&running).context("Display loop failed")?;
    display.stats().log_summary();
    Ok(())
}
