//! Embedding service: one-time backend initialization and the fallback chain

use crate::model::{BackendKind, ImageEmbedder, ModelLoader};
use crate::signature::{reference_vector, PixelSignatureEmbedder};
use crate::source::{DefaultFetcher, ImageFetcher, ImageSource};
use bytes::Bytes;
use pixmatch_core::{Embedding, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Configuration for the embedding service
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Switch to pixel signatures when the model cannot load
    pub fallback_enabled: bool,
    pub fetch_timeout: Duration,
    /// Larger inputs are treated like undecodable ones
    pub max_image_bytes: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            fetch_timeout: Duration::from_secs(10),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
enum ActiveBackend {
    Ready {
        embedder: Arc<dyn ImageEmbedder>,
        kind: BackendKind,
    },
    Unavailable(String),
}

/// Converts image sources into normalized embeddings
///
/// The backend is chosen once, on first use. If the primary model fails to
/// load the service stays on the fallback for its whole lifetime.
pub struct EmbeddingService {
    loader: Arc<dyn ModelLoader>,
    fetcher: Arc<dyn ImageFetcher>,
    config: EmbedConfig,
    backend: OnceCell<ActiveBackend>,
}

impl EmbeddingService {
    pub fn new(loader: Arc<dyn ModelLoader>, config: EmbedConfig) -> Result<Self> {
        let fetcher = Arc::new(DefaultFetcher::new(config.fetch_timeout)?);
        Ok(Self::with_fetcher(loader, fetcher, config))
    }

    pub fn with_fetcher(
        loader: Arc<dyn ModelLoader>,
        fetcher: Arc<dyn ImageFetcher>,
        config: EmbedConfig,
    ) -> Self {
        Self {
            loader,
            fetcher,
            config,
            backend: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    async fn active(&self) -> &ActiveBackend {
        self.backend.get_or_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> ActiveBackend {
        tracing::info!("Initializing image embedding backend");

        let loader = self.loader.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load())
            .await
            .unwrap_or_else(|e| Err(Error::BackendUnavailable(format!("model loader panicked: {}", e))));

        match loaded {
            Ok(embedder) => {
                tracing::info!(
                    backend = embedder.name(),
                    dims = embedder.dimension(),
                    "Vision model ready"
                );
                ActiveBackend::Ready {
                    embedder,
                    kind: BackendKind::Neural,
                }
            }
            Err(e) if self.config.fallback_enabled => {
                tracing::warn!(error = %e, "Vision model unavailable, using pixel-signature fallback");
                ActiveBackend::Ready {
                    embedder: Arc::new(PixelSignatureEmbedder),
                    kind: BackendKind::PixelSignature,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Vision model unavailable and fallback disabled");
                ActiveBackend::Unavailable(e.to_string())
            }
        }
    }

    async fn embedder(&self) -> Result<(Arc<dyn ImageEmbedder>, BackendKind)> {
        match self.active().await {
            ActiveBackend::Ready { embedder, kind } => Ok((embedder.clone(), *kind)),
            ActiveBackend::Unavailable(reason) => Err(Error::BackendUnavailable(reason.clone())),
        }
    }

    /// Initialize the backend if needed; concurrent callers share one attempt
    pub async fn ensure_initialized(&self) -> Result<BackendKind> {
        self.embedder().await.map(|(_, kind)| kind)
    }

    /// Backend kind, if initialization already happened
    pub fn backend_kind(&self) -> Option<BackendKind> {
        match self.backend.get() {
            Some(ActiveBackend::Ready { kind, .. }) => Some(*kind),
            _ => None,
        }
    }

    /// Dimension of every embedding this service produces
    pub async fn dimension(&self) -> Result<usize> {
        self.embedder().await.map(|(embedder, _)| embedder.dimension())
    }

    async fn load_bytes(&self, source: &ImageSource) -> Result<Bytes> {
        let bytes = match source {
            ImageSource::Bytes(bytes) => bytes.clone(),
            ImageSource::Url(location) => {
                match tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(location)).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(Error::Fetch(format!(
                            "{}: timed out after {:?}",
                            location, self.config.fetch_timeout
                        )))
                    }
                }
            }
        };

        if bytes.is_empty() {
            return Err(Error::Decode("empty image".to_string()));
        }
        if bytes.len() > self.config.max_image_bytes {
            return Err(Error::Fetch(format!(
                "image of {} bytes exceeds limit of {}",
                bytes.len(),
                self.config.max_image_bytes
            )));
        }
        Ok(bytes)
    }

    /// Embed an image source
    ///
    /// Undecodable or unreachable inputs fall back to a vector derived from
    /// the source reference. Only backend unavailability and inference
    /// failures surface as errors.
    pub async fn embed(&self, source: &ImageSource) -> Result<Embedding> {
        let (embedder, _) = self.embedder().await?;
        let dim = embedder.dimension();
        let reference = source.reference();

        let raw = match self.load_bytes(source).await {
            Ok(bytes) => {
                let worker = embedder.clone();
                let result = tokio::task::spawn_blocking(move || worker.embed_bytes(&bytes))
                    .await
                    .map_err(|e| Error::Inference(format!("embedding task failed: {}", e)))?;
                match result {
                    Ok(raw) => raw,
                    Err(e) if e.is_recoverable_input() => {
                        tracing::debug!(reference = %reference, error = %e, "Undecodable image, using reference vector");
                        reference_vector(&reference, dim)
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) if e.is_recoverable_input() => {
                tracing::debug!(reference = %reference, error = %e, "Unreadable image, using reference vector");
                reference_vector(&reference, dim)
            }
            Err(e) => return Err(e),
        };

        validate(raw, dim).map(Embedding::normalized_from)
    }
}

/// Shape and value checks at the backend boundary
fn validate(raw: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if raw.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: raw.len(),
        });
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(Error::Inference("embedding contains non-finite values".to_string()));
    }
    Ok(raw)
}
