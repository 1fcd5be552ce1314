// ABOUTME: Main entry point for the garage backend: vehicles, manuals,
// ABOUTME: videos, and maintenance history over SQLite

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod oil;
mod routes;
mod storage;
mod types;
mod uploads;

#[cfg(test)]
mod integration_tests;

use config::Config;
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub upload_dir: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let storage = Storage::connect(&config.database_path).await?;
    storage.seed_default_tags().await?;

    uploads::ensure_upload_dirs(&config.upload_dir).await?;

    let state = AppState {
        storage: Arc::new(storage),
        upload_dir: config.upload_dir.clone(),
    };

    let app = routes::api_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, database = %config.database_path.display(), "garage server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
