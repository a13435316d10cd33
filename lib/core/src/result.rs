use crate::Product;
use std::sync::Arc;

/// A product paired with its score for one search invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub product: Arc<Product>,
    /// Similarity score in [0, 1]
    pub similarity: f32,
    /// Display/tie-break score in [0, 1]
    pub confidence: f32,
    /// Placeholder scores from the featured selector, not a measured similarity
    pub featured: bool,
}

impl RankedResult {
    #[inline]
    #[must_use]
    pub fn new(product: Arc<Product>, similarity: f32, confidence: f32) -> Self {
        Self {
            product,
            similarity,
            confidence,
            featured: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn featured(product: Arc<Product>, similarity: f32, confidence: f32) -> Self {
        Self {
            product,
            similarity,
            confidence,
            featured: true,
        }
    }

    #[inline]
    pub fn product_id(&self) -> &str {
        &self.product.id
    }
}
