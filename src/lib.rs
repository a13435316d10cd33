//! # PixMatch
//!
//! Visual product similarity search: submit a product photo, get back the
//! catalog products that look most like it.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! pixmatch --catalog ./data/products.json --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use pixmatch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let catalog = Arc::new(Catalog::from_json_file("products.json")?);
//! let embedder = Arc::new(EmbeddingService::new(Arc::new(NoModel), EmbedConfig::default())?);
//! let engine = SearchEngine::new(catalog, embedder, SearchConfig::default())?;
//!
//! let outcome = engine
//!     .search(&SearchQuery::new(ImageSource::from_url("https://example.com/jacket.jpg")))
//!     .await;
//! for result in &outcome.results {
//!     println!("{} {:.2}", result.product.name, result.similarity);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`pixmatch-core`](https://docs.rs/pixmatch-core) - Product, Catalog, Embedding, similarity, filters
//! - [`pixmatch-embed`](https://docs.rs/pixmatch-embed) - Image embedding backends and fallback chain
//! - [`pixmatch-search`](https://docs.rs/pixmatch-search) - Embedding cache, ranking, featured fallback
//! - [`pixmatch-api`](https://docs.rs/pixmatch-api) - HTTP API
//!
//! ## Features
//!
//! - `clip`: CLIP vision encoder through ONNX Runtime. Without it every
//!   session runs on the deterministic pixel-signature backend.

// Re-export core types
pub use pixmatch_core::{
    filter, similarity, Catalog, Embedding, Error, FilterCriteria, Product, RankedResult, Result,
    SortKey, SortOrder,
};

// Re-export embedding backends
pub use pixmatch_embed::{
    BackendKind, EmbedConfig, EmbeddingService, ImageEmbedder, ImageFetcher, ImageSource,
    ModelLoader, NoModel, StaticModel,
};

// Re-export search
pub use pixmatch_search::{
    derive_tag_hints, ErrorSink, FeaturedSelector, SearchConfig, SearchEngine, SearchOutcome,
    SearchQuery,
};

// Re-export API
pub use pixmatch_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Catalog, EmbedConfig, EmbeddingService, Error, FilterCriteria, ImageSource, NoModel,
        Product, RankedResult, Result, SearchConfig, SearchEngine, SearchQuery, SortKey,
        SortOrder,
    };
}
