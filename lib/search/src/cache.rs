use ahash::AHashMap;
use parking_lot::RwLock;
use pixmatch_core::Embedding;
use pixmatch_embed::{EmbeddingService, ImageSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Per-product embedding memo for the lifetime of the process
///
/// Each key owns a `OnceCell`, so concurrent requests for the same product
/// share a single computation. Entries are never invalidated.
#[derive(Default)]
pub struct EmbeddingCache {
    entries: RwLock<AHashMap<String, Arc<OnceCell<Embedding>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, product_id: &str) -> Arc<OnceCell<Embedding>> {
        if let Some(cell) = self.entries.read().get(product_id) {
            return cell.clone();
        }
        self.entries
            .write()
            .entry(product_id.to_string())
            .or_default()
            .clone()
    }

    /// Cached embedding, computing and storing it on first use
    ///
    /// A failed computation stores a zero-vector placeholder of the service
    /// dimension; one bad product never fails the caller.
    pub async fn get_or_compute(
        &self,
        product_id: &str,
        image_ref: &str,
        service: &EmbeddingService,
    ) -> Embedding {
        let cell = self.cell(product_id);
        if let Some(embedding) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return embedding.clone();
        }

        cell.get_or_init(|| self.compute(product_id, image_ref, service))
            .await
            .clone()
    }

    async fn compute(&self, product_id: &str, image_ref: &str, service: &EmbeddingService) -> Embedding {
        self.misses.fetch_add(1, Ordering::Relaxed);

        match service.embed(&ImageSource::from_url(image_ref)).await {
            Ok(embedding) => embedding,
            Err(e) => {
                let dim = service.dimension().await.unwrap_or(0);
                tracing::warn!(
                    product_id,
                    image = image_ref,
                    error = %e,
                    "Product embedding failed, storing placeholder"
                );
                Embedding::zeros(dim)
            }
        }
    }

    pub fn get(&self, product_id: &str) -> Option<Embedding> {
        self.entries
            .read()
            .get(product_id)
            .and_then(|cell| cell.get().cloned())
    }

    /// True if the product's stored embedding is the failure placeholder
    pub fn is_placeholder(&self, product_id: &str) -> bool {
        self.get(product_id)
            .map(|e| e.is_degenerate())
            .unwrap_or(false)
    }

    /// Number of computed entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
