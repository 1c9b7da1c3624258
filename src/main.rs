//! Winch Point Revenue - revenue reporting service for the storefront dashboard

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use winchpoint_revenue::{api::{router, AppState}, BackendOrderSource, Config, RevenueAggregator};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let source = BackendOrderSource::new(config.orders_endpoint(), config.backend_timeout)?;
    tracing::info!(backend = %source.endpoint(), timezone = %config.timezone, "order source configured");
    let state = AppState::new(Arc::new(source), RevenueAggregator::new(config.timezone));

    let app = router(state);
    tracing::info!("🚀 Winch Point Revenue listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
