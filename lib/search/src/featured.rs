use pixmatch_core::{Catalog, Product, RankedResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;

/// Placeholder similarity band for featured products
pub const FEATURED_SIMILARITY: Range<f32> = 0.8..1.0;

/// Placeholder confidence band for featured products
pub const FEATURED_CONFIDENCE: Range<f32> = 0.9..1.0;

/// Random "trending" selection used for cold start and as search fallback
///
/// Scores produced here are presentation placeholders; every result carries
/// `featured = true`.
#[derive(Debug, Clone)]
pub struct FeaturedSelector {
    catalog: Arc<Catalog>,
}

impl FeaturedSelector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn featured(&self, count: usize) -> Vec<RankedResult> {
        self.featured_with(count, &mut rand::rng())
    }

    pub fn featured_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<RankedResult> {
        let mut products: Vec<Arc<Product>> = self.catalog.products().to_vec();
        products.shuffle(rng);
        products.truncate(count);

        products
            .into_iter()
            .map(|product| {
                let similarity = rng.random_range(FEATURED_SIMILARITY);
                let confidence = rng.random_range(FEATURED_CONFIDENCE);
                RankedResult::featured(product, similarity, confidence)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn catalog(n: usize) -> Arc<Catalog> {
        let products = (0..n)
            .map(|i| Product::new(format!("p{i}"), format!("Product {i}"), "Home", 10.0 + i as f64, format!("{i}.jpg")))
            .collect();
        Arc::new(Catalog::new(products).unwrap())
    }

    #[test]
    fn test_featured_count_and_bands() {
        let selector = FeaturedSelector::new(catalog(20));
        let results = selector.featured(12);
        assert_eq!(results.len(), 12);
        for r in &results {
            assert!(r.featured);
            assert!(FEATURED_SIMILARITY.contains(&r.similarity));
            assert!(FEATURED_CONFIDENCE.contains(&r.confidence));
        }
        let ids: HashSet<_> = results.iter().map(|r| r.product_id().to_string()).collect();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_count_larger_than_catalog() {
        let selector = FeaturedSelector::new(catalog(3));
        assert_eq!(selector.featured(12).len(), 3);
        assert!(FeaturedSelector::new(catalog(0)).featured(5).is_empty());
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let selector = FeaturedSelector::new(catalog(30));
        let a = selector.featured_with(8, &mut StdRng::seed_from_u64(7));
        let b = selector.featured_with(8, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
