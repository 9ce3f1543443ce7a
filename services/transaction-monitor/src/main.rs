//! Transaction Monitor - Main Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transaction_monitor::{MonitorConfig, start_server};

/// Sliding-window statistics over recent transactions
#[derive(Debug, Parser)]
#[command(name = "transaction-monitor", version, about)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "transaction-monitor.toml")]
    config: String,

    /// Print available routes and exit
    #[arg(long)]
    routes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transaction_monitor=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match MonitorConfig::from_file(&cli.config) {
        Ok(config) => {
            info!("Loaded configuration from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("Failed to load config from {}: {}", cli.config, e);
            info!("Using default configuration");
            MonitorConfig::default()
        }
    };

    if cli.routes {
        transaction_monitor::server::print_routes(&config);
        return Ok(());
    }

    info!(
        "Starting Transaction Monitor v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Server will bind to: {}", config.server_address());
    info!("Sweep interval: {}ms", config.repository.sweep_interval_ms);
    info!("Metrics: {}", config.monitoring.metrics_enabled);

    if let Err(e) = start_server(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
