use pixmatch_core::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Which backend produced a session's embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pretrained vision encoder
    Neural,
    /// Deterministic pixel statistics (degraded mode)
    PixelSignature,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Neural => write!(f, "neural"),
            BackendKind::PixelSignature => write!(f, "pixel_signature"),
        }
    }
}

/// Turns encoded image bytes into a raw feature vector
///
/// Implementations return `Error::Decode` when the bytes are not an image;
/// the service recovers from that with a reference-derived vector.
pub trait ImageEmbedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>>;
}

/// Initializes the primary embedder; called at most once per service
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn ImageEmbedder>>;
}

/// Loader used when no vision model is configured
#[derive(Debug, Clone, Default)]
pub struct NoModel;

impl ModelLoader for NoModel {
    fn load(&self) -> Result<Arc<dyn ImageEmbedder>> {
        Err(Error::BackendUnavailable(
            "no vision model configured".to_string(),
        ))
    }
}

/// Loader that hands out an already constructed embedder
pub struct StaticModel {
    embedder: Arc<dyn ImageEmbedder>,
}

impl StaticModel {
    pub fn new(embedder: Arc<dyn ImageEmbedder>) -> Self {
        Self { embedder }
    }
}

impl ModelLoader for StaticModel {
    fn load(&self) -> Result<Arc<dyn ImageEmbedder>> {
        Ok(self.embedder.clone())
    }
}
