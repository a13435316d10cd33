//! # PixMatch Core
//!
//! Core library for the PixMatch visual product search engine.
//!
//! This crate provides the data model and the pure parts of the engine:
//!
//! - [`Embedding`] - L2-normalized image feature vector
//! - [`similarity`] - blended cosine/euclidean similarity metric
//! - [`Product`] and [`Catalog`] - the read-only product list
//! - [`RankedResult`] - a product with similarity and confidence
//! - [`filter::apply`] - category/price/similarity filters and sorting
//!
//! ## Example
//!
//! ```rust
//! use pixmatch_core::{similarity, Embedding};
//!
//! let a = Embedding::normalized_from(vec![3.0, 4.0]);
//! let b = Embedding::normalized_from(vec![3.0, 4.0]);
//! let score = similarity::embedding_similarity(&a, &b).unwrap();
//! assert!((score - 1.0).abs() < 1e-6);
//! ```

pub mod embedding;
pub mod error;
pub mod filter;
pub mod product;
pub mod result;
pub mod similarity;

pub use embedding::{normalize, Embedding};
pub use error::{Error, Result};
pub use filter::{Filter, FilterCriteria, SortKey, SortOrder};
pub use product::{Catalog, Product};
pub use result::RankedResult;
