//! Portfolio RS command-line tool
//!
//! Loads a portfolio JSON export and prints normalized data, filtered
//! entries, category statistics or resolved attachment links.

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pf_core::config::{AppConfig, LoggingConfig};

mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let config = config.unwrap_or_else(|e| {
        warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });

    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting portfolio tool");

    let output = commands::run(cli, &config)?;
    println!("{}", output);
    Ok(())
}

/// Initialize tracing/logging on stderr, keeping stdout for command output
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
