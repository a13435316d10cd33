//! # PixMatch Search
//!
//! Visual search orchestration for PixMatch.
//!
//! - [`SearchEngine`] - embeds the query, scores the catalog in batches, ranks
//! - [`EmbeddingCache`] - per-product embeddings, computed at most once
//! - [`FeaturedSelector`] - random "trending" picks for cold start and fallback
//! - [`derive_tag_hints`] - tag hints from an image's display name
//!
//! A search never fails from the caller's point of view: [`SearchEngine::search`]
//! reports the cause to an [`ErrorSink`] and serves featured products instead.

pub mod cache;
pub mod engine;
pub mod featured;
pub mod hints;
pub mod sink;

#[cfg(test)]
mod testing;

pub use cache::EmbeddingCache;
pub use engine::{confidence, rank, SearchConfig, SearchEngine, SearchOutcome, SearchQuery};
pub use featured::FeaturedSelector;
pub use hints::derive_tag_hints;
pub use sink::{ErrorSink, TracingSink};
