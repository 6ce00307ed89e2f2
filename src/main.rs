use anyhow::{Context, Result};
use clap::Parser;
use house_price_server::api::{create_router, AppState};
use house_price_server::config::ServerConfig;
use house_price_server::models::{ModelDownloader, ModelLoader, TransformRegistry};
use house_price_server::PredictionService;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    // The model must be loaded before the listener is bound; there is no
    // degraded mode.
    let downloader = ModelDownloader::new(
        config.model_url.clone(),
        config.model_path.clone(),
        config.download_timeout(),
    )
    .context("Failed to build HTTP client")?
    .with_checksum(config.model_sha256.clone());
    let loader = ModelLoader::new(downloader, TransformRegistry::standard());
    let predictor = loader
        .load()
        .await
        .with_context(|| format!("Failed to load model from {}", config.model_url))?;

    let state = AppState::new(
        PredictionService::new(predictor),
        loader.downloader().cache_path(),
    )
    .context("Failed to compile page template")?;
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "serving predictions");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
