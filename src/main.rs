use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dor_radar::config::redact;
use dor_radar::duration::format_duration;
use dor_radar::{RadarConfig, RadarServer};

#[derive(Parser, Debug)]
#[command(name = "dor-radar", version)]
#[command(about = "Network status radar for probe reliability data")]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "./config.toml")]
    config: PathBuf,

    /// Override the listen address from the config (host:port)
    #[arg(short, long)]
    listen: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = RadarConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let listen = args.listen.unwrap_or_else(|| config.listen.clone());

    let collector = config
        .collector
        .build_collector()
        .context("Failed to set up collector")?;
    info!(
        target_url = %redact(&config.collector.to),
        timeout = %format_duration(config.collector.timeout()?),
        shapes = config.collector.shapes.len(),
        propagation = ?config.collector.propagation,
        "collector ready"
    );

    RadarServer::new(listen, collector).run().await
}
