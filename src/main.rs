//! Hyperliquid webhook signal executor.
//!
//! Receives TradingView-style alerts over HTTP and turns them into
//! percent-of-margin market orders on Hyperliquid perpetuals, flipping
//! opposite-direction positions along the way.

mod api;
mod auth;
mod config;
mod models;
mod server;
mod trading;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::HyperliquidClient;
use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::server::AppState;
use crate::trading::PositionManager;

/// Webhook signal executor CLI.
#[derive(Parser)]
#[command(name = "hypersignal")]
#[command(about = "Execute TradingView webhook signals on Hyperliquid perpetuals", long_about = None)]
struct Cli {
    /// Address to bind the webhook listener on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the webhook listener on
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::from_env()?;

    let client = HyperliquidClient::new(&config.private_key, config.use_mainnet)?;
    let address = client.address();
    info!(
        address = %address,
        network = if config.use_mainnet { "mainnet" } else { "testnet" },
        "Wallet ready"
    );

    let authenticator = Authenticator::new(
        config.webhook_password.clone(),
        config.allowed_source_ips.clone(),
    );
    let manager = PositionManager::new(client, address);

    let state = AppState {
        authenticator: Arc::new(authenticator),
        manager: Arc::new(manager),
    };

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    server::run(state, addr).await
}
