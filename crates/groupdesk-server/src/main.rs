//! GroupDesk service entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Advisor group-trading service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GROUPDESK_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    groupdesk_telemetry::init_logging()?;

    info!("Starting GroupDesk v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > GROUPDESK_CONFIG > config/default.toml > built-in defaults
    let config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            groupdesk_server::AppConfig::from_file(&path)?
        }
        None => groupdesk_server::AppConfig::load()?,
    };
    info!(
        bind = %config.api.bind_addr(),
        seeded_users = config.users.len(),
        "Configuration loaded"
    );

    let app = groupdesk_server::Application::new(config).await?;
    app.run().await?;

    Ok(())
}
