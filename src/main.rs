use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use promptforge::config::AppConfig;
use promptforge::database::Database;
use promptforge::server::{self, ApiState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load();
    let data_dir = config.data_dir();
    info!(
        version = promptforge::VERSION,
        data_dir = %data_dir.display(),
        "Starting promptforge"
    );

    let db = Database::new(&data_dir)
        .await
        .context("failed to open database")?;

    let addr = config.bind_addr().context("invalid bind address")?;
    let state = Arc::new(ApiState::new(db));
    server::run(state, addr).await
}
