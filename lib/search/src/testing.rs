// Deterministic embedder and fetcher for unit tests
use async_trait::async_trait;
use bytes::Bytes;
use pixmatch_core::{Error, Result};
use pixmatch_embed::{EmbedConfig, EmbeddingService, ImageEmbedder, ImageFetcher, StaticModel};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hands back the location itself as the image bytes
pub struct EchoFetcher;

#[async_trait]
impl ImageFetcher for EchoFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(location.as_bytes()))
    }
}

/// Maps image bytes (read as UTF-8 names) to fixed raw vectors
pub struct TestEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    dim: usize,
    calls: Arc<AtomicUsize>,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl TestEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            failing: HashSet::new(),
            dim: 2,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with(mut self, name: &str, vector: Vec<f32>) -> Self {
        self.dim = vector.len();
        self.vectors.insert(name.to_string(), vector);
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Block each call for `delay` (wall clock)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of calls running at the same time
    pub fn peak_in_flight(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }
}

impl ImageEmbedder for TestEmbedder {
    fn name(&self) -> &str {
        "test"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let name = String::from_utf8_lossy(bytes).to_string();
        if self.failing.contains(&name) {
            return Err(Error::Inference(format!("simulated failure for {}", name)));
        }
        self.vectors
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::Inference(format!("no vector for {}", name)))
    }
}

pub fn service_with(embedder: TestEmbedder) -> EmbeddingService {
    EmbeddingService::with_fetcher(
        Arc::new(StaticModel::new(Arc::new(embedder))),
        Arc::new(EchoFetcher),
        EmbedConfig::default(),
    )
}

/// Unit vector at the given cosine to `[1, 0]`
pub fn at_cosine(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).max(0.0).sqrt()]
}
