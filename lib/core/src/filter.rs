// Result filtering and sorting, independent of how results were produced
use crate::RankedResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub trait Filter {
    fn matches(&self, result: &RankedResult) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Similarity,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filter and sort options; a `None` field means no constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_similarity: Option<f32>,
    #[serde(default)]
    pub price_range: Option<(f64, f64)>,
    #[serde(default)]
    pub sort_by: Option<SortKey>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn min_similarity(mut self, min: f32) -> Self {
        self.min_similarity = Some(min);
        self
    }

    #[must_use]
    pub fn price_range(mut self, min: f64, max: f64) -> Self {
        self.price_range = Some((min, max));
        self
    }

    #[must_use]
    pub fn sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_by = Some(key);
        self.sort_order = Some(order);
        self
    }

    /// The UI default: best matches first
    pub fn by_similarity() -> Self {
        Self::new().sort(SortKey::Similarity, SortOrder::Desc)
    }

    fn compare(key: SortKey, a: &RankedResult, b: &RankedResult) -> Ordering {
        match key {
            SortKey::Similarity => a.similarity.total_cmp(&b.similarity),
            SortKey::Price => a.product.price.total_cmp(&b.product.price),
            SortKey::Name => collate(&a.product.name, &b.product.name),
        }
    }
}

/// Case-insensitive name order; names differing only in case put lowercase first
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

impl Filter for FilterCriteria {
    fn matches(&self, result: &RankedResult) -> bool {
        if let Some(category) = &self.category {
            if result.product.category != *category {
                return false;
            }
        }

        if let Some(min) = self.min_similarity {
            if result.similarity < min {
                return false;
            }
        }

        if let Some((min, max)) = self.price_range {
            let price = result.product.price;
            if price < min || price > max {
                return false;
            }
        }

        true
    }
}

/// Filter, then stable-sort, a result list without touching the input
pub fn apply(results: &[RankedResult], criteria: &FilterCriteria) -> Vec<RankedResult> {
    let mut filtered: Vec<RankedResult> = results
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();

    if let (Some(key), Some(order)) = (criteria.sort_by, criteria.sort_order) {
        filtered.sort_by(|a, b| {
            let ordering = FilterCriteria::compare(key, a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Product;
    use std::sync::Arc;

    fn result(id: &str, name: &str, category: &str, price: f64, similarity: f32) -> RankedResult {
        let product = Product::new(id, name, category, price, format!("{id}.jpg"));
        RankedResult::new(Arc::new(product), similarity, similarity)
    }

    fn sample() -> Vec<RankedResult> {
        vec![
            result("1", "Wireless Headphones", "Electronics", 199.99, 0.91),
            result("2", "Denim Jeans", "Fashion", 59.0, 0.74),
            result("3", "Ceramic Mug", "Home", 12.5, 0.55),
            result("4", "Laptop Stand", "Electronics", 49.0, 0.62),
            result("5", "Bomber Jacket", "Fashion", 149.0, 0.88),
        ]
    }

    fn ids(results: &[RankedResult]) -> Vec<&str> {
        results.iter().map(|r| r.product_id()).collect()
    }

    #[test]
    fn test_price_range_inclusive() {
        let results = vec![
            result("a", "A", "X", 100.0, 0.5),
            result("b", "B", "X", 300.0, 0.5),
            result("c", "C", "X", 600.0, 0.5),
        ];
        let filtered = apply(&results, &FilterCriteria::new().price_range(0.0, 500.0));
        assert_eq!(ids(&filtered), vec!["a", "b"]);

        let edge = apply(&results, &FilterCriteria::new().price_range(300.0, 600.0));
        assert_eq!(ids(&edge), vec!["b", "c"]);
    }

    #[test]
    fn test_category_exact_match() {
        let filtered = apply(&sample(), &FilterCriteria::new().category("Fashion"));
        assert_eq!(ids(&filtered), vec!["2", "5"]);

        let none = apply(&sample(), &FilterCriteria::new().category("fashion"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_min_similarity_inclusive() {
        let filtered = apply(&sample(), &FilterCriteria::new().min_similarity(0.74));
        assert_eq!(ids(&filtered), vec!["1", "2", "5"]);
    }

    #[test]
    fn test_no_sort_keeps_order() {
        let input = sample();
        let filtered = apply(&input, &FilterCriteria::new());
        assert_eq!(filtered, input);

        // sort_by without sort_order leaves order alone too
        let mut criteria = FilterCriteria::new();
        criteria.sort_by = Some(SortKey::Price);
        assert_eq!(ids(&apply(&input, &criteria)), ids(&input));
    }

    #[test]
    fn test_sort_by_price() {
        let asc = apply(&sample(), &FilterCriteria::new().sort(SortKey::Price, SortOrder::Asc));
        assert_eq!(ids(&asc), vec!["3", "4", "2", "5", "1"]);
        let desc = apply(&sample(), &FilterCriteria::new().sort(SortKey::Price, SortOrder::Desc));
        assert_eq!(ids(&desc), vec!["1", "5", "2", "4", "3"]);
    }

    #[test]
    fn test_sort_by_similarity_desc() {
        let sorted = apply(&sample(), &FilterCriteria::by_similarity());
        assert_eq!(ids(&sorted), vec!["1", "5", "2", "4", "3"]);
    }

    #[test]
    fn test_name_sort_reverses() {
        let asc = apply(&sample(), &FilterCriteria::new().sort(SortKey::Name, SortOrder::Asc));
        let mut desc = apply(&sample(), &FilterCriteria::new().sort(SortKey::Name, SortOrder::Desc));
        desc.reverse();
        assert_eq!(asc, desc);
        assert_eq!(asc[0].product.name, "Bomber Jacket");
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let results = vec![
            result("z", "Zebra Mug", "Home", 10.0, 0.5),
            result("a", "apple Watch", "Electronics", 10.0, 0.5),
            result("b", "Banana Bag", "Fashion", 10.0, 0.5),
        ];
        let asc = apply(&results, &FilterCriteria::new().sort(SortKey::Name, SortOrder::Asc));
        assert_eq!(ids(&asc), vec!["a", "b", "z"]);

        let mut desc = apply(&results, &FilterCriteria::new().sort(SortKey::Name, SortOrder::Desc));
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_collate_case_only_difference() {
        assert_eq!(collate("mug", "Mug"), Ordering::Less);
        assert_eq!(collate("Mug", "mug"), Ordering::Greater);
        assert_eq!(collate("Mug", "Mug"), Ordering::Equal);
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
    }

    #[test]
    fn test_sort_is_stable() {
        let results = vec![
            result("a", "A", "X", 10.0, 0.5),
            result("b", "B", "X", 10.0, 0.5),
            result("c", "C", "X", 5.0, 0.5),
        ];
        let sorted = apply(&results, &FilterCriteria::new().sort(SortKey::Price, SortOrder::Desc));
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_filter_idempotent() {
        let criteria = FilterCriteria::new()
            .price_range(40.0, 200.0)
            .min_similarity(0.6)
            .sort(SortKey::Name, SortOrder::Asc);
        let once = apply(&sample(), &criteria);
        let twice = apply(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = sample();
        let snapshot = input.clone();
        let _ = apply(&input, &FilterCriteria::new().sort(SortKey::Price, SortOrder::Asc));
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_criteria_deserialize_camel_case() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"category":"Fashion","minSimilarity":0.5,"priceRange":[0,500],"sortBy":"price","sortOrder":"desc"}"#,
        )
        .unwrap();
        assert_eq!(criteria.category.as_deref(), Some("Fashion"));
        assert_eq!(criteria.price_range, Some((0.0, 500.0)));
        assert_eq!(criteria.sort_by, Some(SortKey::Price));
        assert_eq!(criteria.sort_order, Some(SortOrder::Desc));
    }
}
