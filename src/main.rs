mod bot;
mod config;
mod dispatch;
mod llm;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration from environment")?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  Base URL: {}", config.llm.base_url);
    info!("  Bot username: {}", config.telegram.bot_username);

    let state = Arc::new(AppState::new(config));

    info!("Bot is starting...");
    bot::run(state).await?;

    Ok(())
}
