//! # ATM Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Restore the cash pool and create the ATM service
//! - Seed the administrator account
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use atm_hex::{AtmService, RateLimiterState, inbound::HttpServer};
use atm_repo::build_repo;

use config::{Config, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,atm_app=debug,atm_hex=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting ATM server on port {}", config.port);
    tracing::info!(
        denominations = %config.policy.denominations,
        strategy = %config.policy.strategy,
        "Cash policy"
    );

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    tracing::info!("Using {} repository", repo.backend());

    // Restore the cash pool and create the service
    let limiter = RateLimiterState::new(config.login_attempts, config.login_window());
    let service = AtmService::new(Arc::new(repo), config.policy.clone())
        .await?
        .with_login_limiter(limiter);

    if let Some(seed) = config.admin.clone() {
        let admin = service.ensure_admin(seed.into()).await?;
        tracing::info!(admin = %admin.mobile, "Administrator account ready");
    }

    // Create and run the HTTP server
    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}
