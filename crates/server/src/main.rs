use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use server::config::ServerConfig;
use server::state::AppState;
use server::create_router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "Generate static web apps from task briefs and publish them to GitHub Pages", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "PAGESMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides config and HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    let state = AppState::from_config(&config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
