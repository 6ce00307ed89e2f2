use super::downloader::ModelDownloader;
use super::predictor::PricePredictor;
use super::registry::TransformRegistry;
use super::types::ModelArtifact;
use crate::error::{ModelError, Result};
use std::sync::Arc;
use tracing::info;

/// Turns the cached artifact into a ready predictor.
pub struct ModelLoader {
    downloader: ModelDownloader,
    registry: TransformRegistry,
}

impl ModelLoader {
    pub fn new(downloader: ModelDownloader, registry: TransformRegistry) -> Self {
        Self {
            downloader,
            registry,
        }
    }

    pub fn downloader(&self) -> &ModelDownloader {
        &self.downloader
    }

    /// Ensures the artifact is cached locally and deserializes it.
    ///
    /// Intended to run once at startup; every error here is fatal.
    pub async fn load(&self) -> Result<Arc<PricePredictor>> {
        let path = self.downloader.ensure_cached().await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ModelError::io(&path, e))?;
        let artifact = ModelArtifact::from_slice(&bytes)?;
        let predictor = PricePredictor::from_artifact(&artifact, &self.registry)?;

        info!(
            url = %self.downloader.url(),
            path = %path.display(),
            trees = predictor.tree_count(),
            encoded_width = predictor.width(),
            transforms_version = self.registry.version(),
            transforms = ?self.registry.names(),
            "model loaded"
        );
        Ok(Arc::new(predictor))
    }
}
