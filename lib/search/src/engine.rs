//! Search orchestrator
//!
//! Embeds the query, scores every catalog product through the embedding
//! cache in bounded batches, ranks, and truncates. Unrecoverable failures
//! are reported to the [`ErrorSink`] and answered with featured products.

use crate::cache::EmbeddingCache;
use crate::featured::FeaturedSelector;
use crate::hints::derive_tag_hints;
use crate::sink::{ErrorSink, TracingSink};
use futures_util::future::join_all;
use pixmatch_core::similarity::embedding_similarity;
use pixmatch_core::{Catalog, Embedding, Error, Product, RankedResult, Result};
use pixmatch_embed::{BackendKind, EmbeddingService, ImageSource};
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound of any confidence value
pub const MAX_CONFIDENCE: f32 = 0.98;

/// Confidence multiplier when a tag hint matches the product
pub const TAG_BOOST: f32 = 1.15;

/// Scores closer than this are ordered by confidence instead
pub const TIE_EPSILON: f32 = 0.05;

/// Score band for products whose embedding could not be computed
pub const PLACEHOLDER_SIMILARITY: Range<f32> = 0.05..0.15;

/// Hard ceiling on `max_results`
pub const MAX_RESULT_BUDGET: usize = 36;

/// Hard ceiling on `batch_size`
pub const MAX_BATCH_SIZE: usize = 32;

/// Configuration for the search orchestrator
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_results: usize,
    /// Concurrent product embeddings per batch
    pub batch_size: usize,
    /// Pause between batches
    pub batch_pause: Duration,
    /// Size of the featured fallback
    pub featured_count: usize,
    /// Applies to a whole search; on trip the featured fallback is served
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 24,
            batch_size: 8,
            batch_pause: Duration::from_millis(10),
            featured_count: 12,
            timeout: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 || self.max_results > MAX_RESULT_BUDGET {
            return Err(Error::InvalidConfig(format!(
                "max_results must be in 1..={}, got {}",
                MAX_RESULT_BUDGET, self.max_results
            )));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(Error::InvalidConfig(format!(
                "batch_size must be in 1..={}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// One search request
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub image: Option<ImageSource>,
    pub tags: Vec<String>,
}

impl SearchQuery {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image: Some(image),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add hints derived from the image's display name
    #[must_use]
    pub fn with_display_name(mut self, name: &str) -> Self {
        for hint in derive_tag_hints(name) {
            if !self.tags.contains(&hint) {
                self.tags.push(hint);
            }
        }
        self
    }
}

/// What a search produced and how
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<RankedResult>,
    /// Results come from the featured fallback
    pub featured: bool,
    pub backend: Option<BackendKind>,
    /// Reason for the fallback, if any
    pub failure: Option<String>,
}

impl SearchOutcome {
    /// Fallback results or a non-neural backend
    pub fn degraded(&self) -> bool {
        self.featured || self.backend != Some(BackendKind::Neural)
    }
}

pub struct SearchEngine {
    catalog: Arc<Catalog>,
    embedder: Arc<EmbeddingService>,
    cache: EmbeddingCache,
    featured: FeaturedSelector,
    config: SearchConfig,
    sink: Arc<dyn ErrorSink>,
}

impl SearchEngine {
    pub fn new(catalog: Arc<Catalog>, embedder: Arc<EmbeddingService>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            featured: FeaturedSelector::new(catalog.clone()),
            catalog,
            embedder,
            cache: EmbeddingCache::new(),
            config,
            sink: Arc::new(TracingSink),
        })
    }

    #[must_use]
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<EmbeddingService> {
        &self.embedder
    }

    pub fn featured(&self, count: usize) -> Vec<RankedResult> {
        self.featured.featured(count)
    }

    /// Search that always yields results
    ///
    /// Any error is handed to the error sink and answered with the featured
    /// selection.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let result = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.try_search(query)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(limit)),
            },
            None => self.try_search(query).await,
        };

        match result {
            Ok(results) => SearchOutcome {
                results,
                featured: false,
                backend: self.embedder.backend_kind(),
                failure: None,
            },
            Err(e) => {
                self.sink.report(&e);
                SearchOutcome {
                    results: self.featured(self.config.featured_count),
                    featured: true,
                    backend: self.embedder.backend_kind(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }

    /// Search surfacing hard failures to the caller
    pub async fn try_search(&self, query: &SearchQuery) -> Result<Vec<RankedResult>> {
        let image = query.image.as_ref().ok_or(Error::MissingImage)?;
        let started = Instant::now();

        let backend = self.embedder.ensure_initialized().await?;
        if self.catalog.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(image).await?;
        let hints: Vec<String> = query
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut results = Vec::with_capacity(self.catalog.len());
        for (index, batch) in self.catalog.products().chunks(self.config.batch_size).enumerate() {
            if index > 0 && !self.config.batch_pause.is_zero() {
                tokio::time::sleep(self.config.batch_pause).await;
            }

            let embeddings = join_all(
                batch
                    .iter()
                    .map(|p| self.cache.get_or_compute(&p.id, &p.image, &self.embedder)),
            )
            .await;

            for (product, embedding) in batch.iter().zip(embeddings.iter()) {
                results.push(score_product(product, &query_embedding, embedding, &hints));
            }
        }

        rank(&mut results);
        results.truncate(self.config.max_results);

        tracing::debug!(
            backend = %backend,
            catalog = self.catalog.len(),
            returned = results.len(),
            cached = self.cache.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Visual search completed"
        );

        Ok(results)
    }
}

fn score_product(
    product: &Arc<Product>,
    query: &Embedding,
    embedding: &Embedding,
    hints: &[String],
) -> RankedResult {
    let similarity = if embedding.is_degenerate() {
        placeholder_similarity()
    } else {
        match embedding_similarity(query, embedding) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(product_id = %product.id, error = %e, "Unscorable product");
                placeholder_similarity()
            }
        }
    };

    RankedResult::new(product.clone(), similarity, confidence(similarity, product, hints))
}

fn placeholder_similarity() -> f32 {
    rand::rng().random_range(PLACEHOLDER_SIMILARITY)
}

/// Similarity clamped to [0, 0.98], boosted by 1.15 on a tag-hint match
pub fn confidence(similarity: f32, product: &Product, hints: &[String]) -> f32 {
    let base = similarity.clamp(0.0, MAX_CONFIDENCE);
    if hints.iter().any(|hint| product.matches_hint(hint)) {
        (base * TAG_BOOST).min(MAX_CONFIDENCE)
    } else {
        base
    }
}

/// Order results by descending similarity, near-ties by confidence
///
/// Stable: equal entries keep catalog order.
pub fn rank(results: &mut [RankedResult]) {
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    // the near-tie relation is not transitive, so settle it by insertion
    for i in 1..results.len() {
        let mut j = i;
        while j > 0 && outranks(&results[j], &results[j - 1]) {
            results.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[inline]
fn outranks(a: &RankedResult, b: &RankedResult) -> bool {
    (a.similarity - b.similarity).abs() < TIE_EPSILON && a.confidence > b.confidence
}
