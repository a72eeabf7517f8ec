use std::error::Error;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::engine::PayrollEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_dir =
        std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let bind_address = config.settings().server.bind_address.clone();

    let engine = PayrollEngine::from_config(&config).await?;
    let router = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, config_dir = %config_dir, "Payroll engine listening");
    axum::serve(listener, router).await?;

    Ok(())
}
